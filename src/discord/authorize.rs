//! Role-based authorization for commands.
//!
//! Two configured role names grant access: an admin role and an instructor
//! role. The tiers are not hierarchical; each command states which tiers it
//! accepts, and the admin check is independent of the instructor check.

use crate::config::types::DiscordConfig;

/// Authorization tier of a command invoker.
///
/// Derived from the invoker's role names at dispatch time and discarded
/// afterwards; never cached across commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Admin,
    Instructor,
    None,
}

/// Classify an invoker by their role-name set.
pub fn classify(role_names: &[String], config: &DiscordConfig) -> Tier {
    if role_names.iter().any(|name| *name == config.admin_role) {
        Tier::Admin
    } else if role_names.iter().any(|name| *name == config.instructor_role) {
        Tier::Instructor
    } else {
        Tier::None
    }
}

/// Which tiers a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Admin tier only.
    Admin,
    /// Admin or Instructor tier.
    Staff,
    /// Any non-bot author.
    Everyone,
}

/// Outcome of checking an invoker's tier against a command's access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permit {
    Allowed,
    /// Insufficient tier; drop without a reply.
    DeniedSilent,
    /// Insufficient tier; tell the invoker.
    DeniedNotify,
}

/// Check `tier` against `access`.
///
/// Admin-only commands drop silently for everyone else; staff commands
/// reply with an explicit denial so instructors learn which commands are
/// admin-only and students learn they have none.
pub fn permit(access: Access, tier: Tier) -> Permit {
    match access {
        Access::Everyone => Permit::Allowed,
        Access::Admin => {
            if tier == Tier::Admin {
                Permit::Allowed
            } else {
                Permit::DeniedSilent
            }
        }
        Access::Staff => {
            if tier == Tier::Admin || tier == Tier::Instructor {
                Permit::Allowed
            } else {
                Permit::DeniedNotify
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> DiscordConfig {
        DiscordConfig {
            token: "token".to_string(),
            admin_role: "Founder/Admin".to_string(),
            instructor_role: "Instructor".to_string(),
            student_role: "Students".to_string(),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_admin_role_wins_regardless_of_other_roles() {
        let config = make_config();
        let roles = names(&["Students", "Founder/Admin", "Instructor"]);
        assert_eq!(classify(&roles, &config), Tier::Admin);
    }

    #[test]
    fn test_instructor_without_admin() {
        let config = make_config();
        let roles = names(&["Instructor", "Students"]);
        assert_eq!(classify(&roles, &config), Tier::Instructor);
    }

    #[test]
    fn test_no_configured_role_is_none() {
        let config = make_config();
        assert_eq!(classify(&names(&["Students"]), &config), Tier::None);
        assert_eq!(classify(&[], &config), Tier::None);
    }

    #[test]
    fn test_role_name_match_is_exact() {
        let config = make_config();
        // Case differs from the configured name
        assert_eq!(classify(&names(&["founder/admin"]), &config), Tier::None);
    }

    #[test]
    fn test_admin_access_drops_silently() {
        assert_eq!(permit(Access::Admin, Tier::Admin), Permit::Allowed);
        assert_eq!(permit(Access::Admin, Tier::Instructor), Permit::DeniedSilent);
        assert_eq!(permit(Access::Admin, Tier::None), Permit::DeniedSilent);
    }

    #[test]
    fn test_staff_access_notifies_on_denial() {
        assert_eq!(permit(Access::Staff, Tier::Admin), Permit::Allowed);
        assert_eq!(permit(Access::Staff, Tier::Instructor), Permit::Allowed);
        assert_eq!(permit(Access::Staff, Tier::None), Permit::DeniedNotify);
    }

    #[test]
    fn test_everyone_access() {
        assert_eq!(permit(Access::Everyone, Tier::None), Permit::Allowed);
    }
}
