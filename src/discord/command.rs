//! Command grammar: `!<command> [args...]`.
//!
//! Parsing happens in two stages. [`tokenize`] splits a raw message body
//! into a lower-cased command name and its argument tokens. The name maps
//! to a [`CommandKind`] (unknown names are ignored by the dispatcher), and
//! [`Command::parse_args`] then builds a typed command from the tokens,
//! failing with the command's usage string when the shape is wrong.
//! Reference arguments stay unresolved here; the executor resolves them
//! against the guild directory.

use serenity::model::id::UserId;

use crate::discord::authorize::Access;
use crate::discord::resolver::{channel_mention_id, member_mention_id};

/// A raw tokenized message: lower-cased command name plus argument tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// Split a message body on whitespace runs.
///
/// The first token becomes the command name, lower-cased; the rest keep
/// their case. A blank body yields an empty name, which matches no command.
pub fn tokenize(body: &str) -> RawCommand {
    let mut tokens = body.split_whitespace();
    let name = tokens.next().unwrap_or_default().to_lowercase();
    let args = tokens.map(str::to_string).collect();
    RawCommand { name, args }
}

/// The set of recognized commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    AddRole,
    RemoveRole,
    CreateRole,
    DeleteRole,
    RenameRole,
    Verify,
    Kick,
    Ban,
    Unban,
    DeleteAll,
    CreateChannel,
    DeleteChannel,
    CreatePrivateChannel,
    SendDm,
    Chat,
}

impl CommandKind {
    /// Map a tokenized command name to a kind. `None` means the message is
    /// not a recognized command and is ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "!help" => Some(Self::Help),
            "!addrole" => Some(Self::AddRole),
            "!removerole" => Some(Self::RemoveRole),
            "!createrole" => Some(Self::CreateRole),
            "!deleterole" => Some(Self::DeleteRole),
            "!renamerole" => Some(Self::RenameRole),
            "!verify" => Some(Self::Verify),
            "!kick" => Some(Self::Kick),
            "!ban" => Some(Self::Ban),
            "!unban" => Some(Self::Unban),
            "!deleteall" => Some(Self::DeleteAll),
            "!createchannel" => Some(Self::CreateChannel),
            "!deletechannel" => Some(Self::DeleteChannel),
            "!createprivatechannel" => Some(Self::CreatePrivateChannel),
            "!senddm" => Some(Self::SendDm),
            "!chat" => Some(Self::Chat),
            _ => None,
        }
    }

    /// Which tiers may invoke this command.
    pub fn access(self) -> Access {
        match self {
            Self::Verify => Access::Staff,
            Self::Chat => Access::Everyone,
            _ => Access::Admin,
        }
    }

    /// Usage line sent back on malformed or unresolvable arguments.
    pub fn usage(self) -> &'static str {
        match self {
            Self::Help => "Usage: !help",
            Self::AddRole => "Usage: !addrole <role> <user>",
            Self::RemoveRole => "Usage: !removerole <role> <user>",
            Self::CreateRole => "Usage: !createrole <name>",
            Self::DeleteRole => "Usage: !deleterole <role>",
            Self::RenameRole => "Usage: !renamerole <oldName> <newName>",
            Self::Verify => "Usage: !verify @user",
            Self::Kick => "Usage: !kick @user",
            Self::Ban => "Usage: !ban @user",
            Self::Unban => "Usage: !unban <userID>",
            Self::DeleteAll => "Usage: !deleteall [#channel/channel-name]",
            Self::CreateChannel => "Usage: !createchannel <name>",
            Self::DeleteChannel => "Usage: !deletechannel [#channel/channel-name]",
            Self::CreatePrivateChannel => "Usage: !createprivatechannel @user",
            Self::SendDm => "Usage: !sendDM <message> @user",
            Self::Chat => "Usage: !chat <message> [#channel/channel-name] [@user]",
        }
    }
}

/// A fully parsed command. Reference fields hold the raw token; the
/// executor resolves them against the current directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    AddRole { role: String, member: String },
    RemoveRole { role: String, member: String },
    CreateRole { name: String },
    DeleteRole { role: String },
    RenameRole { old_name: String, new_name: String },
    Verify { member: UserId },
    Kick { member: UserId },
    Ban { member: UserId },
    Unban { user_id: UserId },
    DeleteAll { channel: Option<String> },
    CreateChannel { name: String },
    DeleteChannel { channel: String },
    CreatePrivateChannel { member: UserId },
    SendDm { member: UserId, text: String },
    Chat {
        prompt: String,
        channel: Option<String>,
        mention: Option<UserId>,
    },
}

/// Argument shape did not match the command; reply with `usage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedArguments {
    pub usage: &'static str,
}

impl Command {
    /// Build a typed command from argument tokens.
    pub fn parse_args(kind: CommandKind, args: &[String]) -> Result<Self, MalformedArguments> {
        let malformed = || MalformedArguments { usage: kind.usage() };

        match kind {
            CommandKind::Help => Ok(Self::Help),

            CommandKind::AddRole | CommandKind::RemoveRole => {
                if args.len() < 2 {
                    return Err(malformed());
                }
                let role = args[0].clone();
                let member = args[1..].join(" ");
                if kind == CommandKind::AddRole {
                    Ok(Self::AddRole { role, member })
                } else {
                    Ok(Self::RemoveRole { role, member })
                }
            }

            CommandKind::CreateRole => {
                let name = args.join(" ");
                if name.is_empty() {
                    return Err(malformed());
                }
                Ok(Self::CreateRole { name })
            }

            CommandKind::DeleteRole => {
                let role = args.join(" ");
                if role.is_empty() {
                    return Err(malformed());
                }
                Ok(Self::DeleteRole { role })
            }

            CommandKind::RenameRole => {
                if args.len() < 2 {
                    return Err(malformed());
                }
                Ok(Self::RenameRole {
                    old_name: args[0].clone(),
                    new_name: args[1..].join(" "),
                })
            }

            CommandKind::Verify => {
                let member = first_member_mention(args).ok_or_else(malformed)?;
                Ok(Self::Verify { member })
            }

            CommandKind::Kick => {
                let member = first_member_mention(args).ok_or_else(malformed)?;
                Ok(Self::Kick { member })
            }

            CommandKind::Ban => {
                let member = first_member_mention(args).ok_or_else(malformed)?;
                Ok(Self::Ban { member })
            }

            CommandKind::Unban => {
                let user_id = args
                    .first()
                    .and_then(|arg| arg.parse::<u64>().ok())
                    .ok_or_else(malformed)?;
                Ok(Self::Unban {
                    user_id: UserId::new(user_id),
                })
            }

            CommandKind::DeleteAll => {
                let channel = if args.is_empty() {
                    None
                } else {
                    Some(args.join(" "))
                };
                Ok(Self::DeleteAll { channel })
            }

            CommandKind::CreateChannel => {
                let name = args.join("-");
                if name.is_empty() {
                    return Err(malformed());
                }
                Ok(Self::CreateChannel { name })
            }

            CommandKind::DeleteChannel => {
                let channel = args.join(" ");
                if channel.is_empty() {
                    return Err(malformed());
                }
                Ok(Self::DeleteChannel { channel })
            }

            CommandKind::CreatePrivateChannel => {
                let member = first_member_mention(args).ok_or_else(malformed)?;
                Ok(Self::CreatePrivateChannel { member })
            }

            CommandKind::SendDm => {
                let member = first_member_mention(args).ok_or_else(malformed)?;
                let text = args
                    .iter()
                    .filter(|arg| !arg.starts_with("<@"))
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" ");
                if text.is_empty() {
                    return Err(malformed());
                }
                Ok(Self::SendDm { member, text })
            }

            CommandKind::Chat => {
                let mention = first_member_mention(args);
                let channel = args
                    .iter()
                    .find(|arg| is_channel_token(arg))
                    .cloned();
                let prompt = args
                    .iter()
                    .filter(|arg| !arg.starts_with("<@") && !is_channel_token(arg))
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" ");
                if prompt.is_empty() {
                    return Err(malformed());
                }
                Ok(Self::Chat {
                    prompt,
                    channel,
                    mention,
                })
            }
        }
    }
}

/// First argument token that is a `<@id>`/`<@!id>` member mention.
fn first_member_mention(args: &[String]) -> Option<UserId> {
    args.iter().find_map(|arg| member_mention_id(arg))
}

/// Whether a token selects a target channel: a `<#id>` mention or a
/// `#name` literal.
fn is_channel_token(token: &str) -> bool {
    channel_mention_id(token).is_some() || (token.starts_with('#') && token.len() > 1)
}
