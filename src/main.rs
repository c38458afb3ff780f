//! Proctor - Discord moderation and AI-chat bot
//!
//! Parses a `!command` grammar out of guild messages, enforces a two-tier
//! role-based permission model, executes administrative actions against
//! the guild, and relays free text to a chat-completion backend.

mod common;
mod completion;
mod config;
mod discord;
mod web;

use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tracing::{error, info, warn};

use completion::CompletionClient;
use config::env::get_config_path;
use discord::Bot;

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env file before reading the environment
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Proctor v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = config::load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        error!("See the example configuration for reference.");
        e
    })?;
    let config = Arc::new(config);

    info!("Configuration loaded successfully");
    info!("  Admin role: {}", config.discord.admin_role);
    info!("  Instructor role: {}", config.discord.instructor_role);
    info!("  Student role: {}", config.discord.student_role);
    info!("  Completion model: {}", config.completion.model);

    let completion = CompletionClient::new(&config.completion)?;

    // ============================================================
    // Keep-alive web server + self-ping
    // ============================================================
    let web_config = config.web.clone();
    tokio::spawn(async move {
        if let Err(error) = web::serve(web_config).await {
            error!("Keep-alive server error: {:#}", error);
        }
    });
    if config.web.self_ping_secs > 0 {
        web::spawn_self_ping(config.web.port, config.web.self_ping_secs);
    }

    // ============================================================
    // Discord gateway session
    // ============================================================
    info!("Starting Discord bot...");
    let bot = Bot::connect(config.clone(), completion).await?;
    let shard_manager = bot.shard_manager();

    let mut bot_task = tokio::spawn(bot.run());

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - disconnecting...");
            true
        }
        _ = &mut bot_task => {
            warn!("Discord task ended on its own");
            false
        }
    };

    // Handle graceful shutdown
    if shutdown {
        shard_manager.shutdown_all().await;

        let timeout = tokio::time::Duration::from_secs(5);
        match tokio::time::timeout(timeout, bot_task).await {
            Ok(Ok(())) => info!("Discord client shut down gracefully"),
            Ok(Err(e)) => warn!("Discord task panicked: {}", e),
            Err(_) => warn!("Discord shutdown timed out"),
        }
    }

    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
