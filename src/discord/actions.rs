//! Action executors for parsed commands.
//!
//! One handler per command. Handlers resolve their reference arguments
//! against the per-event directory snapshot, reply with the command's usage
//! string when a reference does not resolve (mutating nothing), and
//! otherwise perform the Discord REST call and confirm to the invoking
//! channel. REST mutations get a small bounded retry before the failure is
//! reported; no failure here is allowed to take down the event loop.

use std::sync::Arc;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use serenity::builder::{CreateChannel, EditRole, GetMessages};
use serenity::model::channel::{ChannelType, PermissionOverwrite, PermissionOverwriteType};
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serenity::model::permissions::Permissions;
use serenity::prelude::*;
use tracing::{error, info, warn};

use crate::common::chunk::{split_message, MESSAGE_LIMIT};
use crate::completion::CompletionClient;
use crate::config::Config;
use crate::discord::command::{Command, CommandKind};
use crate::discord::resolver::GuildSnapshot;

/// Retry attempts for a single REST mutation.
const REST_RETRIES: usize = 2;

/// Consecutive no-progress batches before the deleteall loop gives up.
const DELETE_ALL_STALL_LIMIT: u32 = 3;

fn rest_backoff() -> impl Iterator<Item = Duration> {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(400))
        .with_max_times(REST_RETRIES)
        .build()
}

/// Run a REST call, retrying with backoff before giving up.
async fn with_retry<T, Fut>(mut call: impl FnMut() -> Fut) -> serenity::Result<T>
where
    Fut: std::future::Future<Output = serenity::Result<T>>,
{
    let mut delays = rest_backoff();
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) => match delays.next() {
                Some(delay) => {
                    warn!("Discord API call failed ({}), retrying in {:?}", error, delay);
                    tokio::time::sleep(delay).await;
                }
                None => return Err(error),
            },
        }
    }
}

/// Executes parsed commands against the guild and the completion backend.
pub struct ActionExecutor {
    config: Arc<Config>,
    completion: CompletionClient,
}

impl ActionExecutor {
    pub fn new(config: Arc<Config>, completion: CompletionClient) -> Self {
        Self { config, completion }
    }

    async fn reply(&self, ctx: &Context, channel_id: ChannelId, text: impl Into<String>) -> anyhow::Result<()> {
        channel_id.say(&ctx.http, text.into()).await?;
        Ok(())
    }

    /// Execute a parsed command. Returns `Err` only for failures the
    /// dispatcher should report as a generic command failure.
    pub async fn execute(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        invoking_channel: ChannelId,
        snapshot: &GuildSnapshot,
        command: Command,
    ) -> anyhow::Result<()> {
        match command {
            Command::Help => self.handle_help(ctx, invoking_channel).await,
            Command::AddRole { role, member } => {
                self.handle_role_change(ctx, guild_id, invoking_channel, snapshot, &role, &member, true)
                    .await
            }
            Command::RemoveRole { role, member } => {
                self.handle_role_change(ctx, guild_id, invoking_channel, snapshot, &role, &member, false)
                    .await
            }
            Command::CreateRole { name } => {
                self.handle_create_role(ctx, guild_id, invoking_channel, &name).await
            }
            Command::DeleteRole { role } => {
                self.handle_delete_role(ctx, guild_id, invoking_channel, snapshot, &role).await
            }
            Command::RenameRole { old_name, new_name } => {
                self.handle_rename_role(ctx, guild_id, invoking_channel, snapshot, &old_name, &new_name)
                    .await
            }
            Command::Verify { member } => {
                self.handle_verify(ctx, guild_id, invoking_channel, snapshot, member).await
            }
            Command::Kick { member } => {
                self.handle_kick(ctx, guild_id, invoking_channel, snapshot, member).await
            }
            Command::Ban { member } => {
                self.handle_ban(ctx, guild_id, invoking_channel, snapshot, member).await
            }
            Command::Unban { user_id } => {
                self.handle_unban(ctx, guild_id, invoking_channel, user_id).await
            }
            Command::DeleteAll { channel } => {
                self.handle_delete_all(ctx, invoking_channel, snapshot, channel.as_deref()).await
            }
            Command::CreateChannel { name } => {
                self.handle_create_channel(ctx, guild_id, invoking_channel, &name).await
            }
            Command::DeleteChannel { channel } => {
                self.handle_delete_channel(ctx, invoking_channel, snapshot, &channel).await
            }
            Command::CreatePrivateChannel { member } => {
                self.handle_create_private_channel(ctx, guild_id, invoking_channel, snapshot, member)
                    .await
            }
            Command::SendDm { member, text } => {
                self.handle_send_dm(ctx, invoking_channel, snapshot, member, &text).await
            }
            Command::Chat {
                prompt,
                channel,
                mention,
            } => {
                self.handle_chat(ctx, invoking_channel, snapshot, &prompt, channel.as_deref(), mention)
                    .await
            }
        }
    }

    async fn handle_help(&self, ctx: &Context, channel_id: ChannelId) -> anyhow::Result<()> {
        let help_text = format!(
            r#"**Available Commands:**

**Admin & Instructor:**
• `!verify @user` - Give the {student} role to a mentioned user

**Admin only:**
• `!help` - Show this help message
• `!addrole <role> <user>` - Add a role to a user
• `!removerole <role> <user>` - Remove a role from a user
• `!createrole <name>` - Create a new role
• `!deleterole <role>` - Delete an existing role
• `!renamerole <oldName> <newName>` - Rename a role
• `!kick @user` - Kick a user from the server
• `!ban @user` - Ban a user from the server
• `!unban <userID>` - Unban a user by ID
• `!deleteall [#channel]` - Delete all messages in a channel
• `!createchannel <name>` - Create a text channel
• `!deletechannel <name>` - Delete a text channel
• `!createprivatechannel @user` - Create a private channel for a user + Admins
• `!sendDM <message> @user` - Send a private DM to a user

**Everyone:**
• `!chat <message> [#channel] [@user]` - Chat via AI in the current or a named channel"#,
            student = self.config.discord.student_role
        );

        self.reply(ctx, channel_id, help_text).await
    }

    async fn handle_role_change(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
        snapshot: &GuildSnapshot,
        role_token: &str,
        member_token: &str,
        add: bool,
    ) -> anyhow::Result<()> {
        let kind = if add { CommandKind::AddRole } else { CommandKind::RemoveRole };
        let (Some(role), Some(member)) = (
            snapshot.resolve_role(role_token),
            snapshot.resolve_member(member_token),
        ) else {
            return self.reply(ctx, channel_id, kind.usage()).await;
        };

        if add {
            with_retry(|| ctx.http.add_member_role(guild_id, member.id, role.id, None)).await?;
            info!("Added role '{}' to {}", role.name, member.display_name());
            self.reply(
                ctx,
                channel_id,
                format!("✅ Added {} to {}", role.name, member.display_name()),
            )
            .await
        } else {
            with_retry(|| ctx.http.remove_member_role(guild_id, member.id, role.id, None)).await?;
            info!("Removed role '{}' from {}", role.name, member.display_name());
            self.reply(
                ctx,
                channel_id,
                format!("✅ Removed {} from {}", role.name, member.display_name()),
            )
            .await
        }
    }

    async fn handle_create_role(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
        name: &str,
    ) -> anyhow::Result<()> {
        with_retry(|| guild_id.create_role(&ctx.http, EditRole::new().name(name))).await?;
        info!("Created role '{}'", name);
        self.reply(ctx, channel_id, format!("✅ Role \"{}\" created", name))
            .await
    }

    async fn handle_delete_role(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
        snapshot: &GuildSnapshot,
        role_token: &str,
    ) -> anyhow::Result<()> {
        let Some(role) = snapshot.resolve_role(role_token) else {
            return self.reply(ctx, channel_id, CommandKind::DeleteRole.usage()).await;
        };

        with_retry(|| guild_id.delete_role(&ctx.http, role.id)).await?;
        info!("Deleted role '{}'", role.name);
        self.reply(ctx, channel_id, format!("✅ Role \"{}\" deleted", role.name))
            .await
    }

    async fn handle_rename_role(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
        snapshot: &GuildSnapshot,
        old_name: &str,
        new_name: &str,
    ) -> anyhow::Result<()> {
        let Some(role) = snapshot.resolve_role(old_name) else {
            return self.reply(ctx, channel_id, CommandKind::RenameRole.usage()).await;
        };

        with_retry(|| guild_id.edit_role(&ctx.http, role.id, EditRole::new().name(new_name)))
            .await?;
        info!("Renamed role '{}' to '{}'", old_name, new_name);
        self.reply(
            ctx,
            channel_id,
            format!("✅ Renamed \"{}\" to \"{}\"", old_name, new_name),
        )
        .await
    }

    async fn handle_verify(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
        snapshot: &GuildSnapshot,
        member_id: UserId,
    ) -> anyhow::Result<()> {
        let Some(member) = snapshot.member_by_id(member_id) else {
            return self.reply(ctx, channel_id, CommandKind::Verify.usage()).await;
        };

        let student_role = self.config.discord.student_role.as_str();
        let Some(role) = snapshot.role_named(student_role) else {
            return self
                .reply(ctx, channel_id, format!("❌ '{}' role not found.", student_role))
                .await;
        };

        with_retry(|| ctx.http.add_member_role(guild_id, member.id, role.id, None)).await?;
        info!("Verified {}", member.display_name());
        self.reply(
            ctx,
            channel_id,
            format!(
                "✅ {} has been verified and given the {} role!",
                member.display_name(),
                student_role
            ),
        )
        .await
    }

    async fn handle_kick(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
        snapshot: &GuildSnapshot,
        member_id: UserId,
    ) -> anyhow::Result<()> {
        let Some(member) = snapshot.member_by_id(member_id) else {
            return self.reply(ctx, channel_id, CommandKind::Kick.usage()).await;
        };

        with_retry(|| guild_id.kick(&ctx.http, member.id)).await?;
        info!("Kicked {}", member.display_name());
        self.reply(ctx, channel_id, format!("✅ Kicked {}", member.display_name()))
            .await
    }

    async fn handle_ban(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
        snapshot: &GuildSnapshot,
        member_id: UserId,
    ) -> anyhow::Result<()> {
        let Some(member) = snapshot.member_by_id(member_id) else {
            return self.reply(ctx, channel_id, CommandKind::Ban.usage()).await;
        };

        with_retry(|| guild_id.ban(&ctx.http, member.id, 0)).await?;
        info!("Banned {}", member.display_name());
        self.reply(ctx, channel_id, format!("✅ Banned {}", member.display_name()))
            .await
    }

    async fn handle_unban(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> anyhow::Result<()> {
        with_retry(|| ctx.http.remove_ban(guild_id, user_id, None)).await?;
        info!("Unbanned user {}", user_id);
        self.reply(ctx, channel_id, format!("✅ Unbanned user ID {}", user_id))
            .await
    }

    /// Repeatedly fetch the most recent messages and bulk-delete them until
    /// fewer than two remain. Fresh state is fetched after every batch, so a
    /// failed batch is retried against whatever is actually left; the loop
    /// bails once it stops making progress (bulk delete rejects messages
    /// older than two weeks).
    async fn handle_delete_all(
        &self,
        ctx: &Context,
        invoking_channel: ChannelId,
        snapshot: &GuildSnapshot,
        channel_token: Option<&str>,
    ) -> anyhow::Result<()> {
        let target = channel_token
            .and_then(|token| snapshot.resolve_channel(token))
            .map(|channel| channel.id)
            .unwrap_or(invoking_channel);

        let mut stalled = 0;
        loop {
            let batch = target.messages(&ctx.http, GetMessages::new().limit(100)).await?;
            if batch.len() < 2 {
                break;
            }

            let ids: Vec<MessageId> = batch.iter().map(|message| message.id).collect();
            match target.delete_messages(&ctx.http, &ids).await {
                Ok(()) => {
                    info!("Bulk-deleted {} messages in {}", ids.len(), target);
                    stalled = 0;
                }
                Err(error) => {
                    error!("Bulk delete failed in {}: {}", target, error);
                    stalled += 1;
                    if stalled >= DELETE_ALL_STALL_LIMIT {
                        warn!("Giving up on {} after {} stalled batches", target, stalled);
                        break;
                    }
                }
            }
        }

        self.reply(ctx, invoking_channel, "✅ Deleted all messages in this channel")
            .await
    }

    async fn handle_create_channel(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
        name: &str,
    ) -> anyhow::Result<()> {
        let created = with_retry(|| {
            guild_id.create_channel(&ctx.http, CreateChannel::new(name).kind(ChannelType::Text))
        })
        .await;

        match created {
            Ok(channel) => {
                info!("Created channel '{}'", channel.name);
                self.reply(ctx, channel_id, format!("✅ Channel created: <#{}>", channel.id))
                    .await
            }
            Err(error) => {
                error!("Failed to create channel '{}': {}", name, error);
                self.reply(ctx, channel_id, "❌ Failed to create channel.").await
            }
        }
    }

    async fn handle_delete_channel(
        &self,
        ctx: &Context,
        channel_id: ChannelId,
        snapshot: &GuildSnapshot,
        channel_token: &str,
    ) -> anyhow::Result<()> {
        let Some(channel) = snapshot.resolve_channel(channel_token) else {
            return self.reply(ctx, channel_id, "❌ Channel not found.").await;
        };

        match with_retry(|| channel.id.delete(&ctx.http)).await {
            Ok(_) => {
                info!("Deleted channel '{}'", channel.name);
                self.reply(ctx, channel_id, format!("✅ Channel deleted: {}", channel.name))
                    .await
            }
            Err(error) => {
                error!("Failed to delete channel '{}': {}", channel.name, error);
                self.reply(ctx, channel_id, "❌ Failed to delete channel.").await
            }
        }
    }

    async fn handle_create_private_channel(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
        snapshot: &GuildSnapshot,
        member_id: UserId,
    ) -> anyhow::Result<()> {
        let Some(member) = snapshot.member_by_id(member_id) else {
            return self
                .reply(ctx, channel_id, CommandKind::CreatePrivateChannel.usage())
                .await;
        };

        let member_allow =
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY;

        // Everyone is denied visibility; the member and the admin role are
        // allowed back in. The @everyone role id equals the guild id.
        let mut overwrites = vec![
            PermissionOverwrite {
                allow: Permissions::empty(),
                deny: Permissions::VIEW_CHANNEL,
                kind: PermissionOverwriteType::Role(RoleId::new(guild_id.get())),
            },
            PermissionOverwrite {
                allow: member_allow,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Member(member.id),
            },
        ];
        if let Some(admin_role) = snapshot.role_named(&self.config.discord.admin_role) {
            overwrites.push(PermissionOverwrite {
                allow: member_allow | Permissions::MANAGE_CHANNELS,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Role(admin_role.id),
            });
        }

        let name = format!("{}-private", member.username);
        let created = with_retry(|| {
            guild_id.create_channel(
                &ctx.http,
                CreateChannel::new(&name)
                    .kind(ChannelType::Text)
                    .permissions(overwrites.clone()),
            )
        })
        .await;

        match created {
            Ok(channel) => {
                info!("Created private channel '{}' for {}", channel.name, member.display_name());
                self.reply(
                    ctx,
                    channel_id,
                    format!("✅ Private channel created: <#{}>", channel.id),
                )
                .await
            }
            Err(error) => {
                error!("Failed to create private channel '{}': {}", name, error);
                self.reply(ctx, channel_id, "❌ Failed to create private channel.")
                    .await
            }
        }
    }

    async fn handle_send_dm(
        &self,
        ctx: &Context,
        channel_id: ChannelId,
        snapshot: &GuildSnapshot,
        member_id: UserId,
        text: &str,
    ) -> anyhow::Result<()> {
        let Some(member) = snapshot.member_by_id(member_id) else {
            return self.reply(ctx, channel_id, CommandKind::SendDm.usage()).await;
        };

        let delivered = match member.id.create_dm_channel(&ctx.http).await {
            Ok(dm) => dm.id.say(&ctx.http, text).await.map(|_| ()),
            Err(error) => Err(error),
        };

        match delivered {
            Ok(()) => {
                info!("Sent DM to {}", member.display_name());
                self.reply(ctx, channel_id, format!("✅ Sent DM to {}", member.display_name()))
                    .await
            }
            Err(error) => {
                warn!("Could not DM {}: {}", member.display_name(), error);
                self.reply(
                    ctx,
                    channel_id,
                    format!(
                        "❌ Could not send DM to {}. They might have DMs disabled.",
                        member.display_name()
                    ),
                )
                .await
            }
        }
    }

    /// Relay a prompt to the completion backend and send the response,
    /// chunked, to the target channel. Backend failures are reported to the
    /// invoking channel with a generic message.
    async fn handle_chat(
        &self,
        ctx: &Context,
        invoking_channel: ChannelId,
        snapshot: &GuildSnapshot,
        prompt: &str,
        channel_token: Option<&str>,
        mention: Option<UserId>,
    ) -> anyhow::Result<()> {
        let target = channel_token
            .and_then(|token| snapshot.resolve_channel(token))
            .map(|channel| channel.id)
            .unwrap_or(invoking_channel);

        match self.completion.complete(prompt).await {
            Ok(text) => {
                let reply = match mention {
                    Some(user_id) => format!("<@{}>, {}", user_id, text),
                    None => text,
                };
                for chunk in split_message(&reply, MESSAGE_LIMIT) {
                    target.say(&ctx.http, chunk).await?;
                }
                Ok(())
            }
            Err(error) => {
                error!("Completion request failed: {}", error);
                self.reply(ctx, invoking_channel, "❌ Error while executing AI chat.")
                    .await
            }
        }
    }
}
