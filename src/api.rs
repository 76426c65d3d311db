//! HTTP surface for Rusty Digest.
//!
//! This module exposes a compact Axum router:
//!
//! - `GET /` – Minimal HTML upload form.
//! - `POST /summarize` – Multipart upload of one or more PDFs (`file` fields) with optional
//!   `style`, `model`, `max_chars`, and `format` text fields. Each document runs through the
//!   pipeline on its own; failures are reported inline per file and never abort the rest of the
//!   upload. `format=html` renders the summaries with download links and `format=markdown`
//!   returns a single `<filename>.summary.md` attachment.
//! - `GET /styles` – Available tone presets and their instructions.
//! - `GET /metrics` – Summarization counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.

use crate::batch::SUMMARY_SUFFIX;
use crate::processing::{PipelineConfig, Style, SummarizationApi};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use pulldown_cmark::{Event, Parser};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const MIN_UPLOAD_CHUNK_CHARS: usize = 1000;
const MAX_UPLOAD_CHUNK_CHARS: usize = 12_000;

/// Shared router state: the pipeline plus the environment's default settings.
pub struct ApiState<S> {
    service: Arc<S>,
    defaults: PipelineConfig,
}

impl<S> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            defaults: self.defaults.clone(),
        }
    }
}

/// Build the HTTP router exposing the upload surface.
pub fn create_router<S>(service: Arc<S>, defaults: PipelineConfig, max_upload_bytes: usize) -> Router
where
    S: SummarizationApi + 'static,
{
    Router::new()
        .route("/", get(upload_form))
        .route("/summarize", post(summarize_uploads::<S>))
        .route("/styles", get(list_styles))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(ApiState { service, defaults })
}

/// Per-file result returned by `POST /summarize`.
#[derive(Debug, Serialize)]
struct UploadResult {
    /// Original upload name.
    filename: String,
    /// Suggested name for the downloadable Markdown artifact.
    download_name: String,
    /// Markdown summary, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    /// Number of chunks the document was split into, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    chunk_count: Option<usize>,
    /// Error message, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Response body for `POST /summarize`.
#[derive(Debug, Serialize)]
struct SummarizeResponse {
    results: Vec<UploadResult>,
}

/// How `POST /summarize` answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseFormat {
    /// One JSON entry per file.
    Json,
    /// Rendered result page with download links, used by the upload form.
    Html,
    /// The single file's summary as a `text/markdown` attachment.
    Markdown,
}

impl ResponseFormat {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(AppError::bad_request(format!(
                "format must be json, html, or markdown, got '{other}'"
            ))),
        }
    }
}

struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

/// Summarize every uploaded document.
///
/// Option fields may appear anywhere in the form; all fields are read before the first
/// document is processed. Documents run one after another in upload order. The `format` field
/// selects a JSON body (default), an HTML result page, or a Markdown download of a single file.
async fn summarize_uploads<S>(
    State(state): State<ApiState<S>>,
    mut multipart: Multipart,
) -> Result<Response, AppError>
where
    S: SummarizationApi,
{
    let mut config = state.defaults.clone();
    let mut format = ResponseFormat::Json;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::bad_request(format!("invalid multipart body: {error}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "style" => config.style = Style::parse_lossy(&read_text(field).await?),
            "model" => {
                let model = read_text(field).await?;
                if !model.trim().is_empty() {
                    config.model = model.trim().to_string();
                }
            }
            "max_chars" => config.max_chars_per_chunk = parse_max_chars(&read_text(field).await?)?,
            "format" => format = ResponseFormat::parse(&read_text(field).await?)?,
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("upload-{}.pdf", uuid::Uuid::new_v4()));
                let bytes = field.bytes().await.map_err(|error| {
                    AppError::bad_request(format!("failed to read {filename}: {error}"))
                })?;
                files.push(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    if files.is_empty() {
        return Err(AppError::bad_request("no files uploaded; use the `file` field"));
    }
    if format == ResponseFormat::Markdown && files.len() > 1 {
        return Err(AppError::bad_request(
            "format=markdown returns one file; upload a single document",
        ));
    }
    config
        .validate()
        .map_err(|error| AppError::bad_request(error.to_string()))?;

    let cancel = CancellationToken::new();
    let mut results = Vec::with_capacity(files.len());
    for UploadedFile { filename, bytes } in files {
        let title = title_for(&filename);
        let download_name = format!("{filename}{SUMMARY_SUFFIX}");
        let result = match state
            .service
            .summarize_bytes(&title, bytes, &config, &cancel)
            .await
        {
            Ok(summary) => UploadResult {
                filename,
                download_name,
                summary: Some(summary.markdown),
                chunk_count: Some(summary.chunk_count),
                error: None,
            },
            Err(error) => {
                tracing::warn!(file = %filename, error = %error, "Upload failed");
                UploadResult {
                    filename,
                    download_name,
                    summary: None,
                    chunk_count: None,
                    error: Some(error.to_string()),
                }
            }
        };
        results.push(result);
    }

    tracing::info!(
        files = results.len(),
        failed = results.iter().filter(|r| r.error.is_some()).count(),
        format = ?format,
        "Upload request completed"
    );
    match format {
        ResponseFormat::Json => Ok(Json(SummarizeResponse { results }).into_response()),
        ResponseFormat::Html => Ok(Html(render_results(&results)).into_response()),
        ResponseFormat::Markdown => markdown_download(results),
    }
}

/// Return the only result as a downloadable `<filename>.summary.md`.
fn markdown_download(results: Vec<UploadResult>) -> Result<Response, AppError> {
    let Some(result) = results.into_iter().next() else {
        return Err(AppError::bad_request("no files uploaded; use the `file` field"));
    };
    let Some(markdown) = result.summary else {
        return Err(AppError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: result.error.unwrap_or_default(),
        });
    };
    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe(&result.download_name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        markdown,
    )
        .into_response())
}

/// Replace characters that cannot appear inside a quoted header parameter.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch == ' ' || (ch.is_ascii_graphic() && ch != '"' && ch != '\\') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Result page for form submissions: each summary rendered as HTML with a download link.
fn render_results(results: &[UploadResult]) -> String {
    let mut page = String::from(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>Rusty Digest results</title></head>\n<body>\n",
    );
    for result in results {
        page.push_str(&format!("<section>\n<h2>{}</h2>\n", escape_html(&result.filename)));
        match (&result.summary, &result.error) {
            (Some(markdown), _) => {
                page.push_str(&format!(
                    "<p><a download=\"{}\" href=\"data:text/markdown;charset=utf-8,{}\">Download {}</a></p>\n",
                    escape_html(&result.download_name),
                    urlencoding::encode(markdown),
                    escape_html(&result.download_name),
                ));
                page.push_str(&markdown_to_html(markdown));
            }
            (None, error) => page.push_str(&format!(
                "<p class=\"error\">Failed: {}</p>\n",
                escape_html(error.as_deref().unwrap_or("unknown error"))
            )),
        }
        page.push_str("</section>\n");
    }
    page.push_str("<p><a href=\"/\">Summarize more documents</a></p>\n</body>\n</html>\n");
    page
}

/// Render Markdown, showing any raw HTML in the summary as text.
fn markdown_to_html(markdown: &str) -> String {
    let events = Parser::new(markdown).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut rendered = String::new();
    pulldown_cmark::html::push_html(&mut rendered, events);
    rendered
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|error| AppError::bad_request(format!("invalid form field: {error}")))
}

fn parse_max_chars(raw: &str) -> Result<usize, AppError> {
    let value: usize = raw
        .trim()
        .parse()
        .map_err(|_| AppError::bad_request(format!("max_chars must be a number, got '{raw}'")))?;
    if !(MIN_UPLOAD_CHUNK_CHARS..=MAX_UPLOAD_CHUNK_CHARS).contains(&value) {
        return Err(AppError::bad_request(format!(
            "max_chars must be between {MIN_UPLOAD_CHUNK_CHARS} and {MAX_UPLOAD_CHUNK_CHARS}"
        )));
    }
    Ok(value)
}

/// Title for an uploaded file: its name without the final extension.
fn title_for(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

#[derive(Serialize)]
struct StyleDescriptor {
    name: &'static str,
    instruction: &'static str,
}

/// List tone presets.
async fn list_styles() -> Json<Vec<StyleDescriptor>> {
    Json(
        Style::ALL
            .into_iter()
            .map(|style| StyleDescriptor {
                name: style.as_str(),
                instruction: style.instruction(),
            })
            .collect(),
    )
}

/// Return the current summarization counters.
async fn get_metrics<S>(State(state): State<ApiState<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: SummarizationApi,
{
    Json(state.service.metrics_snapshot())
}

async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

const UPLOAD_FORM: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Rusty Digest</title></head>
<body>
<h1>PDF summarizer</h1>
<p>Upload one or more PDFs to get a structured Markdown summary of each.</p>
<form action="/summarize" method="post" enctype="multipart/form-data">
  <input type="hidden" name="format" value="html">
  <label>Summary style
    <select name="style">
      <option value="default" selected>default</option>
      <option value="bullet">bullet</option>
      <option value="narrative">narrative</option>
      <option value="executive">executive</option>
    </select>
  </label><br>
  <label>Model <input type="text" name="model" placeholder="server default"></label><br>
  <label>Max characters per chunk
    <input type="number" name="max_chars" min="1000" max="12000" step="500" value="6000">
  </label><br>
  <input type="file" name="file" accept="application/pdf,.pdf" multiple required><br>
  <button type="submit">Summarize</button>
</form>
</body>
</html>
"#;

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summarize",
                description: "Upload PDFs as multipart `file` fields; each is chunked, summarized, and combined into Markdown. Returns one result per file with `summary` or `error`, an HTML page (`format=html`), or a `.summary.md` download (`format=markdown`).",
                request_example: Some(json!({
                    "file": "<pdf bytes>",
                    "style": "executive",
                    "model": "gpt-4.1-mini",
                    "max_chars": 6000,
                    "format": "json | html | markdown"
                })),
            },
            CommandDescriptor {
                name: "styles",
                method: "GET",
                path: "/styles",
                description: "List summary style presets and their tone instructions.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summarization counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands, header_safe, markdown_to_html, title_for};
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{
        DocumentError, FinalSummary, PipelineConfig, PipelineError, Style, SummarizationApi,
        SummaryPath,
    };
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
        response::Response,
    };
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    const BOUNDARY: &str = "digest-test-boundary";

    #[derive(Clone, Debug)]
    struct UploadCall {
        title: String,
        config: PipelineConfig,
    }

    #[derive(Default)]
    struct StubService {
        calls: Mutex<Vec<UploadCall>>,
    }

    #[async_trait]
    impl SummarizationApi for StubService {
        async fn summarize_bytes(
            &self,
            title: &str,
            bytes: Vec<u8>,
            config: &PipelineConfig,
            _cancel: &CancellationToken,
        ) -> Result<FinalSummary, DocumentError> {
            self.calls.lock().await.push(UploadCall {
                title: title.to_string(),
                config: config.clone(),
            });
            if bytes.is_empty() {
                return Err(PipelineError::EmptyDocument {
                    title: title.to_string(),
                }
                .into());
            }
            Ok(FinalSummary {
                title: title.to_string(),
                markdown: format!("# {title}"),
                chunk_count: 2,
                path: SummaryPath::MapReduce,
            })
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_summarized: 7,
                ..MetricsSnapshot::default()
            }
        }
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(filename, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn router(service: Arc<StubService>) -> Router {
        create_router(service, PipelineConfig::default(), 1024 * 1024)
    }

    async fn send_upload(app: Router, parts: &[Part<'_>]) -> Response {
        app.oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/summarize")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(parts)))
                .expect("request"),
        )
        .await
        .expect("router response")
    }

    async fn body_text(response: Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        String::from_utf8(body.to_vec()).expect("utf-8 body")
    }

    async fn post_upload(app: Router, parts: &[Part<'_>]) -> (StatusCode, serde_json::Value) {
        let response = send_upload(app, parts).await;
        let status = response.status();
        let body = body_text(response).await;
        (status, serde_json::from_str(&body).expect("json body"))
    }

    #[tokio::test]
    async fn commands_catalog_exposes_summarize_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let summarize = commands
            .iter()
            .find(|cmd| cmd.name == "summarize")
            .expect("summarize command present");

        assert_eq!(summarize.method, "POST");
        assert_eq!(summarize.path, "/summarize");
        assert!(commands.len() >= 3);
    }

    #[tokio::test]
    async fn upload_reports_each_file_and_applies_options() {
        let service = Arc::new(StubService::default());
        let (status, json) = post_upload(
            router(service.clone()),
            &[
                Part::File("week1.pdf", b"%PDF-fake"),
                Part::Text("style", "Executive"),
                Part::Text("max_chars", "3000"),
                Part::File("blank.pdf", b""),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let results = json["results"].as_array().expect("results");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["filename"], "week1.pdf");
        assert_eq!(results[0]["download_name"], "week1.pdf.summary.md");
        assert_eq!(results[0]["summary"], "# week1");
        assert_eq!(results[0]["chunk_count"], 2);
        assert!(results[0].get("error").is_none());
        assert_eq!(results[1]["filename"], "blank.pdf");
        assert!(
            results[1]["error"]
                .as_str()
                .expect("error message")
                .contains("no extractable text")
        );

        let calls = service.calls.lock().await.clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].title, "week1");
        assert_eq!(calls[0].config.style, Style::Executive);
        assert_eq!(calls[0].config.max_chars_per_chunk, 3000);
        assert_eq!(calls[0].config.model, PipelineConfig::default().model);
    }

    #[tokio::test]
    async fn upload_without_files_is_rejected() {
        let service = Arc::new(StubService::default());
        let (status, json) =
            post_upload(router(service.clone()), &[Part::Text("style", "bullet")]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("no files"));
        assert!(service.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_chunk_size_is_rejected() {
        let service = Arc::new(StubService::default());
        let (status, _) = post_upload(
            router(service.clone()),
            &[Part::Text("max_chars", "200"), Part::File("a.pdf", b"x")],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(service.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn metrics_route_returns_snapshot() {
        let service = Arc::new(StubService::default());
        let response = router(service)
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["documents_summarized"], 7);
    }

    #[test]
    fn titles_drop_the_extension() {
        assert_eq!(title_for("notes.v2.pdf"), "notes.v2");
        assert_eq!(title_for("README"), "README");
        assert_eq!(title_for(".pdf"), ".pdf");
    }

    #[tokio::test]
    async fn markdown_format_returns_a_download() {
        let service = Arc::new(StubService::default());
        let response = send_upload(
            router(service),
            &[Part::Text("format", "markdown"), Part::File("a.pdf", b"%PDF-fake")],
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers[header::CONTENT_TYPE].to_str().unwrap(),
            "text/markdown; charset=utf-8"
        );
        assert_eq!(
            headers[header::CONTENT_DISPOSITION].to_str().unwrap(),
            "attachment; filename=\"a.pdf.summary.md\""
        );
        assert_eq!(body_text(response).await, "# a");
    }

    #[tokio::test]
    async fn markdown_format_reports_a_failed_document() {
        let service = Arc::new(StubService::default());
        let response = send_upload(
            router(service),
            &[Part::Text("format", "markdown"), Part::File("blank.pdf", b"")],
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
        assert!(body_text(response).await.contains("no extractable text"));
    }

    #[tokio::test]
    async fn markdown_format_rejects_multiple_files() {
        let service = Arc::new(StubService::default());
        let (status, json) = post_upload(
            router(service.clone()),
            &[
                Part::Text("format", "markdown"),
                Part::File("a.pdf", b"x"),
                Part::File("b.pdf", b"y"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("single document"));
        assert!(service.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn html_format_renders_summaries_with_download_links() {
        let service = Arc::new(StubService::default());
        let response = send_upload(
            router(service),
            &[
                Part::Text("format", "html"),
                Part::File("week<1>.pdf", b"%PDF-fake"),
                Part::File("blank.pdf", b""),
            ],
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
        let page = body_text(response).await;
        assert!(page.contains("<h2>week&lt;1&gt;.pdf</h2>"));
        assert!(page.contains("download=\"week&lt;1&gt;.pdf.summary.md\""));
        assert!(page.contains("href=\"data:text/markdown;charset=utf-8,%23%20week%3C1%3E\""));
        assert!(page.contains("<h1>week&lt;1&gt;</h1>"));
        assert!(page.contains("<p class=\"error\">Failed: Document &#39;blank&#39; contains no extractable text</p>"));
    }

    #[tokio::test]
    async fn unknown_format_is_rejected() {
        let service = Arc::new(StubService::default());
        let (status, _) = post_upload(
            router(service.clone()),
            &[Part::Text("format", "pdf"), Part::File("a.pdf", b"x")],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(service.calls.lock().await.is_empty());
    }

    #[test]
    fn rendered_markdown_shows_raw_html_as_text() {
        let html = markdown_to_html("# Title\n\n<script>alert(1)</script>\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn download_names_are_header_safe() {
        assert_eq!(header_safe("my \"notes\".pdf.summary.md"), "my _notes_.pdf.summary.md");
        assert_eq!(header_safe("résumé.pdf"), "r_sum_.pdf");
    }
}
