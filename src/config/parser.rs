//! Configuration file parsing (HOCON format).

use std::path::Path;

use hocon::HoconLoader;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    HoconLoader::new()
        .load_file(path)
        .map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

/// Load configuration from a HOCON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let config = load_config_str(
            r#"
            discord { token = "abc123" }
            completion { api_key = "sk-test" }
            "#,
        )
        .expect("minimal config should parse");

        assert_eq!(config.discord.token, "abc123");
        assert_eq!(config.discord.admin_role, "Founder/Admin");
        assert_eq!(config.discord.instructor_role, "Instructor");
        assert_eq!(config.discord.student_role, "Students");
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.completion.base_url, "https://api.openai.com/v1");
        assert_eq!(config.web.port, 3000);
        assert_eq!(config.web.self_ping_secs, 300);
    }

    #[test]
    fn test_overridden_fields_parse() {
        let config = load_config_str(
            r#"
            discord {
                token = "abc123"
                admin_role = "Owner"
                instructor_role = "TA"
            }
            completion {
                api_key = "sk-test"
                base_url = "http://localhost:1234/v1"
                model = "local-model"
            }
            web { port = 8080, self_ping_secs = 0 }
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.discord.admin_role, "Owner");
        assert_eq!(config.discord.instructor_role, "TA");
        assert_eq!(config.completion.base_url, "http://localhost:1234/v1");
        assert_eq!(config.completion.model, "local-model");
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.web.self_ping_secs, 0);
    }

    #[test]
    fn test_missing_required_section_fails() {
        assert!(load_config_str(r#"discord { token = "abc" }"#).is_err());
    }
}
