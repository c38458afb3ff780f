//! Discord message event handling.
//!
//! Entry point of the command pipeline: every inbound message is gated
//! (own and bot authors dropped, guild messages only), tokenized, matched
//! to a command, checked against the invoker's tier, parsed into a typed
//! command, and handed to the executor. No failure past this point is
//! allowed to stop event processing.

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tracing::{debug, error, info, warn};

use crate::completion::CompletionClient;
use crate::config::Config;
use crate::discord::actions::ActionExecutor;
use crate::discord::authorize::{classify, permit, Permit};
use crate::discord::command::{tokenize, Command, CommandKind};
use crate::discord::resolver::GuildSnapshot;

/// Discord event handler.
pub struct ModerationHandler {
    config: Arc<Config>,
    executor: ActionExecutor,
}

impl ModerationHandler {
    pub fn new(config: Arc<Config>, completion: CompletionClient) -> Self {
        let executor = ActionExecutor::new(config.clone(), completion);
        Self { config, executor }
    }

    async fn dispatch(&self, ctx: &Context, msg: &Message) {
        // Only handle guild (server) messages
        let Some(guild_id) = msg.guild_id else {
            return;
        };

        let raw = tokenize(&msg.content);
        let Some(kind) = CommandKind::from_name(&raw.name) else {
            // Not a recognized command; ignore silently
            return;
        };

        // Copy the directory and the invoker's role names out of the cache
        // before the first await. The snapshot is per-event: tier and
        // references are recomputed from current state for every command.
        let (snapshot, invoker_roles) = {
            let Some(guild) = ctx.cache.guild(guild_id) else {
                warn!("Guild {} not cached yet, dropping command", guild_id);
                return;
            };
            let snapshot = GuildSnapshot::from_guild(&guild);
            let invoker_roles = msg
                .member
                .as_deref()
                .map(|member| snapshot.role_names(&member.roles))
                .unwrap_or_default();
            (snapshot, invoker_roles)
        };

        let tier = classify(&invoker_roles, &self.config.discord);
        match permit(kind.access(), tier) {
            Permit::Allowed => {}
            Permit::DeniedSilent => {
                debug!("Dropping {} from {} (tier {:?})", raw.name, msg.author.name, tier);
                return;
            }
            Permit::DeniedNotify => {
                if let Err(error) = msg
                    .channel_id
                    .say(&ctx.http, "❌ You don't have permission to use this command.")
                    .await
                {
                    error!("Failed to send denial reply: {}", error);
                }
                return;
            }
        }

        let command = match Command::parse_args(kind, &raw.args) {
            Ok(command) => command,
            Err(malformed) => {
                if let Err(error) = msg.channel_id.say(&ctx.http, malformed.usage).await {
                    error!("Failed to send usage reply: {}", error);
                }
                return;
            }
        };

        info!("{} command from {}", raw.name, msg.author.name);

        if let Err(error) = self
            .executor
            .execute(ctx, guild_id, msg.channel_id, &snapshot, command)
            .await
        {
            error!("Command {} failed: {:#}", raw.name, error);
            if let Err(error) = msg.channel_id.say(&ctx.http, "❌ Command failed.").await {
                error!("Failed to report command failure: {}", error);
            }
        }
    }
}

#[async_trait]
impl EventHandler for ModerationHandler {
    async fn message(&self, ctx: Context, msg: Message) {
        // Ignore our own messages
        if msg.author.id == ctx.cache.current_user().id {
            return;
        }

        // Ignore bots
        if msg.author.bot {
            return;
        }

        self.dispatch(&ctx, &msg).await;
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Discord bot connected as {}", ready.user.name);
    }
}
