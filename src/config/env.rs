//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `PROCTOR_DISCORD_TOKEN` - Discord bot token
//! - `PROCTOR_ADMIN_ROLE` - Admin role name
//! - `PROCTOR_INSTRUCTOR_ROLE` - Instructor role name
//! - `PROCTOR_STUDENT_ROLE` - Role assigned by verify
//! - `PROCTOR_COMPLETION_API_KEY` - Completion backend API key
//! - `PROCTOR_COMPLETION_BASE_URL` - Completion backend base URL
//! - `PROCTOR_COMPLETION_MODEL` - Model identifier
//! - `PROCTOR_WEB_PORT` (or `PORT`) - Keep-alive server port

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "PROCTOR";

/// Apply environment variable overrides to a config.
///
/// This allows sensitive values like tokens and API keys to be
/// provided via environment variables instead of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    // Discord
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.token = token;
    }
    if let Ok(role) = env::var(format!("{}_ADMIN_ROLE", ENV_PREFIX)) {
        config.discord.admin_role = role;
    }
    if let Ok(role) = env::var(format!("{}_INSTRUCTOR_ROLE", ENV_PREFIX)) {
        config.discord.instructor_role = role;
    }
    if let Ok(role) = env::var(format!("{}_STUDENT_ROLE", ENV_PREFIX)) {
        config.discord.student_role = role;
    }

    // Completion backend
    if let Ok(key) = env::var(format!("{}_COMPLETION_API_KEY", ENV_PREFIX)) {
        config.completion.api_key = key;
    }
    if let Ok(url) = env::var(format!("{}_COMPLETION_BASE_URL", ENV_PREFIX)) {
        config.completion.base_url = url;
    }
    if let Ok(model) = env::var(format!("{}_COMPLETION_MODEL", ENV_PREFIX)) {
        config.completion.model = model;
    }

    // Web server port; hosting platforms conventionally inject bare PORT.
    if let Ok(port) = env::var(format!("{}_WEB_PORT", ENV_PREFIX)) {
        if let Ok(port) = port.parse() {
            config.web.port = port;
        }
    } else if let Ok(port) = env::var("PORT") {
        if let Ok(port) = port.parse() {
            config.web.port = port;
        }
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `PROCTOR_CONFIG`, otherwise returns "proctor.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "proctor.conf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;

    fn make_test_config() -> Config {
        Config {
            discord: DiscordConfig {
                token: "original_token".to_string(),
                admin_role: "Founder/Admin".to_string(),
                instructor_role: "Instructor".to_string(),
                student_role: "Students".to_string(),
            },
            completion: CompletionConfig {
                api_key: "original_key".to_string(),
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
            },
            web: WebConfig::default(),
        }
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(ENV_PREFIX, "PROCTOR");
    }

    #[test]
    fn test_get_config_path_default() {
        // Clear the env var first
        env::remove_var("PROCTOR_CONFIG");
        assert_eq!(get_config_path(), "proctor.conf");
    }

    #[test]
    fn test_apply_env_overrides_no_vars() {
        env::remove_var("PROCTOR_DISCORD_TOKEN");
        env::remove_var("PROCTOR_COMPLETION_API_KEY");
        env::remove_var("PROCTOR_WEB_PORT");
        env::remove_var("PORT");

        let config = make_test_config();
        let result = apply_env_overrides(config);

        // Should remain unchanged
        assert_eq!(result.discord.token, "original_token");
        assert_eq!(result.completion.api_key, "original_key");
        assert_eq!(result.web.port, 3000);
    }
}
