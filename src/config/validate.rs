//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Validate Discord config
    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }
    if config.discord.admin_role.is_empty() {
        errors.push("discord.admin_role must not be empty".to_string());
    }
    if config.discord.instructor_role.is_empty() {
        errors.push("discord.instructor_role must not be empty".to_string());
    }
    if config.discord.student_role.is_empty() {
        errors.push("discord.student_role must not be empty".to_string());
    }

    // Validate completion config
    if config.completion.api_key.is_empty() {
        errors.push("completion.api_key is required".to_string());
    }
    if config.completion.api_key == "YOUR_API_KEY_HERE" {
        errors
            .push("completion.api_key has not been configured (still using placeholder)".to_string());
    }
    if config.completion.base_url.is_empty() {
        errors.push("completion.base_url must not be empty".to_string());
    } else if !config.completion.base_url.starts_with("http") {
        errors.push(format!(
            "completion.base_url '{}' is not an http(s) URL",
            config.completion.base_url
        ));
    }
    if config.completion.model.is_empty() {
        errors.push("completion.model must not be empty".to_string());
    }

    // Validate web config
    if config.web.port == 0 {
        errors.push("web.port must be non-zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;

    fn make_valid_config() -> Config {
        Config {
            discord: DiscordConfig {
                token: "valid_token_here".to_string(),
                admin_role: "Founder/Admin".to_string(),
                instructor_role: "Instructor".to_string(),
                student_role: "Students".to_string(),
            },
            completion: CompletionConfig {
                api_key: "sk-valid".to_string(),
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
            },
            web: WebConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = make_valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = String::new();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("discord.token"));
    }

    #[test]
    fn test_placeholder_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = "YOUR_DISCORD_TOKEN_HERE".to_string();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_empty_role_name_fails() {
        let mut config = make_valid_config();
        config.discord.student_role = String::new();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("discord.student_role"));
    }

    #[test]
    fn test_bad_base_url_fails() {
        let mut config = make_valid_config();
        config.completion.base_url = "localhost:1234".to_string();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("base_url"));
    }

    #[test]
    fn test_zero_port_fails() {
        let mut config = make_valid_config();
        config.web.port = 0;

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("web.port"));
    }

    #[test]
    fn test_errors_are_aggregated() {
        let mut config = make_valid_config();
        config.discord.token = String::new();
        config.completion.api_key = String::new();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("discord.token"));
        assert!(message.contains("completion.api_key"));
    }
}
