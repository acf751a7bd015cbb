use anyhow::Context;
use docdigest::{api, config, extraction, logging, notify::NotificationHub, pipeline, summarizer};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;

// Probed in order when SERVER_PORT is not set.
const FALLBACK_PORTS: std::ops::RangeInclusive<u16> = 4300..=4399;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init_config();
    logging::init_tracing();

    let notifications = Arc::new(NotificationHub::default());
    let pipeline = Arc::new(pipeline::UploadPipeline::new(
        extraction::get_image_text_extractor(),
        summarizer::get_summarization_client(),
        notifications.clone(),
    ));
    let app = api::create_router(pipeline, notifications);

    let (listener, port) = bind_listener().await.context("Failed to bind listener")?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Bind the configured port, or walk the fallback range until one is free.
///
/// A fixed port that is already taken is a hard error; in probe mode only the
/// final exhaustion is, and the last bind failure is what gets reported.
async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    let candidates = match config::get_config().server_port {
        Some(port) => port..=port,
        None => FALLBACK_PORTS,
    };

    let mut last_in_use = None;
    for port in candidates {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use");
                last_in_use = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_in_use.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "No usable server port")
    }))
}
