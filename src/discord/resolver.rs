//! Reference resolution against a guild directory snapshot.
//!
//! Command arguments may name a role, member, or channel either by platform
//! mention syntax (`<@&id>`, `<@id>`, `<@!id>`, `<#id>`) or by a plain
//! case-insensitive name. Resolution tries the mention form first, then
//! falls back to name matching.

use std::sync::OnceLock;

use fancy_regex::Regex;
use serenity::model::guild::Guild;
use serenity::model::id::{ChannelId, RoleId, UserId};

fn role_mention_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^<@&(\d+)>$").unwrap())
}

fn member_mention_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^<@!?(\d+)>$").unwrap())
}

fn channel_mention_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^<#(\d+)>$").unwrap())
}

fn capture_id(pattern: &Regex, token: &str) -> Option<u64> {
    pattern
        .captures(token)
        .ok()
        .flatten()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extract the role id from a `<@&id>` mention token.
pub fn role_mention_id(token: &str) -> Option<RoleId> {
    capture_id(role_mention_pattern(), token).map(RoleId::new)
}

/// Extract the user id from a `<@id>` or `<@!id>` mention token.
pub fn member_mention_id(token: &str) -> Option<UserId> {
    capture_id(member_mention_pattern(), token).map(UserId::new)
}

/// Extract the channel id from a `<#id>` mention token.
pub fn channel_mention_id(token: &str) -> Option<ChannelId> {
    capture_id(channel_mention_pattern(), token).map(ChannelId::new)
}

/// A role as seen in the directory.
#[derive(Debug, Clone)]
pub struct RoleEntry {
    pub id: RoleId,
    pub name: String,
}

/// A guild member as seen in the directory.
#[derive(Debug, Clone)]
pub struct MemberEntry {
    pub id: UserId,
    pub username: String,
    pub nickname: Option<String>,
}

impl MemberEntry {
    /// Nickname if set, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.username)
    }
}

/// A text channel as seen in the directory.
#[derive(Debug, Clone)]
pub struct ChannelEntry {
    pub id: ChannelId,
    pub name: String,
}

/// Point-in-time copy of a guild's roles, members, and channels.
///
/// Built fresh from the gateway cache for every command; nothing resolved
/// against one snapshot is reused for a later command, since the guild may
/// have changed in between.
#[derive(Debug, Clone, Default)]
pub struct GuildSnapshot {
    pub roles: Vec<RoleEntry>,
    pub members: Vec<MemberEntry>,
    pub channels: Vec<ChannelEntry>,
}

impl GuildSnapshot {
    /// Copy the directory out of a cached guild.
    pub fn from_guild(guild: &Guild) -> Self {
        let roles = guild
            .roles
            .iter()
            .map(|(id, role)| RoleEntry {
                id: *id,
                name: role.name.clone(),
            })
            .collect();

        let members = guild
            .members
            .iter()
            .map(|(id, member)| MemberEntry {
                id: *id,
                username: member.user.name.clone(),
                nickname: member.nick.clone(),
            })
            .collect();

        let channels = guild
            .channels
            .iter()
            .map(|(id, channel)| ChannelEntry {
                id: *id,
                name: channel.name.clone(),
            })
            .collect();

        Self {
            roles,
            members,
            channels,
        }
    }

    /// Resolve a role from a `<@&id>` mention or a case-insensitive name.
    pub fn resolve_role(&self, token: &str) -> Option<&RoleEntry> {
        if token.is_empty() {
            return None;
        }
        if let Some(id) = role_mention_id(token) {
            return self.roles.iter().find(|r| r.id == id);
        }
        let needle = token.to_lowercase();
        self.roles.iter().find(|r| r.name.to_lowercase() == needle)
    }

    /// Resolve a member from a `<@id>`/`<@!id>` mention or a
    /// case-insensitive username or nickname.
    pub fn resolve_member(&self, token: &str) -> Option<&MemberEntry> {
        if token.is_empty() {
            return None;
        }
        if let Some(id) = member_mention_id(token) {
            return self.members.iter().find(|m| m.id == id);
        }
        let needle = token.to_lowercase();
        self.members.iter().find(|m| {
            m.username.to_lowercase() == needle
                || m.nickname
                    .as_ref()
                    .is_some_and(|nick| nick.to_lowercase() == needle)
        })
    }

    /// Resolve a channel from a `<#id>` mention or a case-insensitive name.
    /// A leading `#` on a plain name is ignored.
    pub fn resolve_channel(&self, token: &str) -> Option<&ChannelEntry> {
        if token.is_empty() {
            return None;
        }
        if let Some(id) = channel_mention_id(token) {
            return self.channels.iter().find(|c| c.id == id);
        }
        let needle = token.trim_start_matches('#').to_lowercase();
        self.channels
            .iter()
            .find(|c| c.name.to_lowercase() == needle)
    }

    /// Look up a role by exact name (the configured well-known roles).
    pub fn role_named(&self, name: &str) -> Option<&RoleEntry> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// Look up a member by id.
    pub fn member_by_id(&self, id: UserId) -> Option<&MemberEntry> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Names of the roles in `role_ids`, in directory order.
    pub fn role_names(&self, role_ids: &[RoleId]) -> Vec<String> {
        self.roles
            .iter()
            .filter(|r| role_ids.contains(&r.id))
            .map(|r| r.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_snapshot() -> GuildSnapshot {
        GuildSnapshot {
            roles: vec![
                RoleEntry {
                    id: RoleId::new(123),
                    name: "Founder/Admin".to_string(),
                },
                RoleEntry {
                    id: RoleId::new(456),
                    name: "Students".to_string(),
                },
            ],
            members: vec![
                MemberEntry {
                    id: UserId::new(11),
                    username: "Alice".to_string(),
                    nickname: None,
                },
                MemberEntry {
                    id: UserId::new(22),
                    username: "bob123".to_string(),
                    nickname: Some("Bobby".to_string()),
                },
            ],
            channels: vec![ChannelEntry {
                id: ChannelId::new(77),
                name: "general".to_string(),
            }],
        }
    }

    #[test]
    fn test_role_mention_resolves_by_id() {
        let snapshot = make_snapshot();
        let role = snapshot.resolve_role("<@&123>").expect("role should resolve");
        assert_eq!(role.name, "Founder/Admin");

        // Mention of an unknown id does not fall back to name matching
        assert!(snapshot.resolve_role("<@&999>").is_none());
    }

    #[test]
    fn test_role_name_is_case_insensitive() {
        let snapshot = make_snapshot();
        assert_eq!(
            snapshot.resolve_role("students").map(|r| r.id),
            Some(RoleId::new(456))
        );
        assert_eq!(
            snapshot.resolve_role("STUDENTS").map(|r| r.id),
            Some(RoleId::new(456))
        );
    }

    #[test]
    fn test_member_resolves_by_username_or_nickname() {
        let snapshot = make_snapshot();
        assert_eq!(
            snapshot.resolve_member("ALICE").map(|m| m.id),
            Some(UserId::new(11))
        );
        assert_eq!(
            snapshot.resolve_member("bobby").map(|m| m.id),
            Some(UserId::new(22))
        );
        assert!(snapshot.resolve_member("carol").is_none());
    }

    #[test]
    fn test_member_mention_forms() {
        let snapshot = make_snapshot();
        assert_eq!(
            snapshot.resolve_member("<@11>").map(|m| m.id),
            Some(UserId::new(11))
        );
        assert_eq!(
            snapshot.resolve_member("<@!22>").map(|m| m.id),
            Some(UserId::new(22))
        );
    }

    #[test]
    fn test_channel_resolution() {
        let snapshot = make_snapshot();
        assert_eq!(
            snapshot.resolve_channel("<#77>").map(|c| c.id),
            Some(ChannelId::new(77))
        );
        assert_eq!(
            snapshot.resolve_channel("General").map(|c| c.id),
            Some(ChannelId::new(77))
        );
        assert_eq!(
            snapshot.resolve_channel("#general").map(|c| c.id),
            Some(ChannelId::new(77))
        );
    }

    #[test]
    fn test_empty_token_never_resolves() {
        let snapshot = make_snapshot();
        assert!(snapshot.resolve_role("").is_none());
        assert!(snapshot.resolve_member("").is_none());
        assert!(snapshot.resolve_channel("").is_none());
    }

    #[test]
    fn test_mention_extractors() {
        assert_eq!(member_mention_id("<@42>"), Some(UserId::new(42)));
        assert_eq!(member_mention_id("<@!42>"), Some(UserId::new(42)));
        assert_eq!(role_mention_id("<@&42>"), Some(RoleId::new(42)));
        assert_eq!(channel_mention_id("<#42>"), Some(ChannelId::new(42)));

        // Role mentions are not member mentions and vice versa
        assert!(member_mention_id("<@&42>").is_none());
        assert!(role_mention_id("<@42>").is_none());
        assert!(channel_mention_id("general").is_none());
        assert!(member_mention_id("<@42> trailing").is_none());
    }

    #[test]
    fn test_role_named_is_exact() {
        let snapshot = make_snapshot();
        assert!(snapshot.role_named("Students").is_some());
        assert!(snapshot.role_named("students").is_none());
    }
}
