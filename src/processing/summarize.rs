//! Prompt construction and the two generation steps of the pipeline.
//!
//! - [`summarize_chunk`] is the map step: one chunk in, 5–8 bullets out.
//! - [`combine_summaries`] is the reduce step: ordered partial summaries (or one raw chunk) in,
//!   one structured Markdown document out.

use super::chunking::truncate_chars;
use super::style::Style;
use crate::generation::{ChatMessage, GenerationClient, GenerationClientError, GenerationRequest};

/// Placed between partial summaries in the combine request.
pub const PARTIAL_SUMMARY_SEPARATOR: &str = "\n\n---\n\n";

/// Settings shared by both generation steps.
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions<'a> {
    /// Model identifier.
    pub model: &'a str,
    /// Tone preset.
    pub style: Style,
    /// Sampling temperature.
    pub temperature: f32,
    /// Character limit applied to the variable part of the prompt.
    pub max_input_chars: usize,
}

/// Messages for a single chunk-summary request.
pub(crate) fn build_chunk_messages(
    chunk_text: &str,
    style: Style,
    max_input_chars: usize,
) -> Vec<ChatMessage> {
    let system = format!(
        "You are an assistant that summarizes educational documents. {}",
        style.instruction()
    );
    let chunk_chars = chunk_text.chars().count();
    if chunk_chars > max_input_chars {
        tracing::warn!(
            chunk_chars,
            limit = max_input_chars,
            "Chunk input truncated; trailing content dropped"
        );
    }
    let user = format!(
        "Summarize the following part of a longer document as 5-8 bullet points.\n\
         Capture every key idea, definition, and result; do not add information that is not in the text.\n\n\
         Text:\n{}",
        truncate_chars(chunk_text, max_input_chars)
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Messages for the combine request.
pub(crate) fn build_combine_messages(
    partial_summaries: &[String],
    title: &str,
    style: Style,
    max_input_chars: usize,
) -> Vec<ChatMessage> {
    let joined = partial_summaries.join(PARTIAL_SUMMARY_SEPARATOR);
    let joined_chars = joined.chars().count();
    let body = truncate_chars(&joined, max_input_chars);
    if joined_chars > max_input_chars {
        tracing::warn!(
            document = title,
            joined_chars,
            limit = max_input_chars,
            "Combine input truncated; trailing content dropped"
        );
    }

    let system = format!(
        "You merge partial summaries of one document into a single, well-structured summary. {}",
        style.instruction()
    );
    let user = format!(
        "Combine the partial summaries below into one Markdown document using exactly this structure:\n\n\
         # {title}\n\n\
         ## Overview\n\
         A 5-7 sentence overview of the whole document.\n\n\
         ## Key Ideas\n\
         5-10 bullet points with the most important ideas.\n\n\
         ## Action Items\n\
         3-5 bullet points with next steps or study actions. Omit this section if the document does not suggest any.\n\n\
         Remove repetition between parts and keep the order in which ideas appear in the document.\n\n\
         Partial summaries:\n{body}"
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Summarize one chunk into a compact bullet list.
///
/// Errors from the generation service are returned unchanged.
pub async fn summarize_chunk(
    client: &dyn GenerationClient,
    chunk_text: &str,
    options: RequestOptions<'_>,
) -> Result<String, GenerationClientError> {
    let request = GenerationRequest {
        model: options.model.to_string(),
        messages: build_chunk_messages(chunk_text, options.style, options.max_input_chars),
        temperature: options.temperature,
    };
    let text = client.generate(request).await?;
    Ok(text.trim().to_string())
}

/// Merge ordered partial summaries into the final structured summary.
///
/// Errors from the generation service are returned unchanged.
pub async fn combine_summaries(
    client: &dyn GenerationClient,
    partial_summaries: &[String],
    title: &str,
    options: RequestOptions<'_>,
) -> Result<String, GenerationClientError> {
    let request = GenerationRequest {
        model: options.model.to_string(),
        messages: build_combine_messages(
            partial_summaries,
            title,
            options.style,
            options.max_input_chars,
        ),
        temperature: options.temperature,
    };
    let text = client.generate(request).await?;
    Ok(text.trim().to_string())
}
