//! Keep-alive web server.
//!
//! Hosting platforms put idle processes to sleep; the original deployment
//! sidesteps that with a tiny HTTP server plus a periodic self-ping. The
//! server exposes the static status page from the public directory and a
//! `/run` endpoint for poking the bot from a browser.

use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use crate::config::types::WebConfig;

/// Serve the keep-alive endpoints until the process exits.
pub async fn serve(config: WebConfig) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/run", get(run_trigger))
        .fallback_service(ServeDir::new(&config.public_dir));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Keep-alive server running on port {}", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_trigger() -> &'static str {
    info!("Run endpoint triggered");
    "✅ Run action triggered!"
}

/// Ping our own keep-alive server on a fixed interval so the host does not
/// put the process to sleep.
pub fn spawn_self_ping(port: u16, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let url = format!("http://127.0.0.1:{}/", port);
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
        {
            Ok(client) => client,
            Err(error) => {
                warn!("Self-ping disabled, could not build client: {}", error);
                return;
            }
        };

        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick completes immediately; skip it so the server has
        // time to come up.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match client.get(&url).send().await {
                Ok(_) => debug!("Self-ping to stay awake"),
                Err(error) => warn!("Self-ping failed: {}", error),
            }
        }
    })
}
