//! Discord gateway session.
//!
//! Wraps the serenity client behind an explicit lifecycle: build the
//! session with [`Bot::connect`], drive it with [`Bot::run`], and stop it
//! through the shard manager. Nothing here lives in a global.

use std::sync::Arc;
use std::time::Duration;

use backon::BackoffBuilder;
use serenity::client::ClientBuilder;
use serenity::gateway::ShardManager;
use serenity::http::HttpBuilder;
use serenity::prelude::*;
use serenity::Client;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::completion::CompletionClient;
use crate::config::Config;
use crate::discord::handler::ModerationHandler;

/// An authenticated gateway session.
pub struct Bot {
    client: Client,
}

impl Bot {
    /// Build the gateway client with the moderation handler installed.
    pub async fn connect(config: Arc<Config>, completion: CompletionClient) -> anyhow::Result<Self> {
        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MEMBERS;

        // Build a custom reqwest client with timeout settings
        let reqwest_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let http = HttpBuilder::new(&config.discord.token)
            .client(reqwest_client)
            .build();

        let handler = ModerationHandler::new(config.clone(), completion);
        let client = ClientBuilder::new_with_http(http, intents)
            .event_handler(handler)
            .await?;

        Ok(Self { client })
    }

    /// Handle for shutting the gateway down from outside `run`.
    pub fn shard_manager(&self) -> Arc<ShardManager> {
        self.client.shard_manager.clone()
    }

    /// Run the session until it disconnects for good.
    ///
    /// Serenity reconnects shards on its own; this loop only restarts the
    /// client after a fatal error, with exponential backoff.
    pub async fn run(mut self) {
        /// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
        fn gateway_backoff() -> impl Iterator<Item = Duration> {
            backon::ExponentialBuilder::default()
                .with_min_delay(Duration::from_secs(5))
                .with_max_delay(Duration::from_secs(300))
                .with_factor(1.1)
                .with_jitter()
                .without_max_times()
                .build()
        }

        let mut backoff = gateway_backoff();

        loop {
            info!("Connecting to Discord...");

            match self.client.start().await {
                Ok(()) => {
                    info!("Discord client disconnected normally");
                    break;
                }
                Err(error) => {
                    error!("Discord client error: {}", error);
                    let delay = backoff.next().unwrap_or(Duration::from_secs(300));
                    warn!(
                        "Discord disconnected. Reconnecting in {:.1}s...",
                        delay.as_secs_f64(),
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
