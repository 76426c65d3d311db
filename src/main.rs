use rustydigest::{api, config, extraction::PdfTextExtractor, generation, logging, processing};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let config = match config::init_config() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    };
    logging::init_tracing();

    let client = match generation::build_generation_client(config) {
        Ok(client) => client,
        Err(error) => {
            tracing::error!(%error, "Failed to build generation client");
            std::process::exit(1);
        }
    };
    let service = processing::SummarizationService::new(client, Arc::new(PdfTextExtractor));
    let app = api::create_router(
        Arc::new(service),
        config.pipeline_defaults(),
        config.max_upload_bytes,
    );

    let (listener, port) = match bind_listener().await {
        Ok(bound) => bound,
        Err(error) => {
            tracing::error!(%error, "Failed to bind listener");
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    if let Err(error) = axum::serve(listener, app).await {
        tracing::error!(%error, "Server terminated");
        std::process::exit(1);
    }
}

async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    let config = config::get_config();
    if let Some(port) = config.server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 4100..=4199;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 4100-4199",
    ))
}
