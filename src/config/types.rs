//! Configuration type definitions.

use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    pub completion: CompletionConfig,
    #[serde(default)]
    pub web: WebConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    /// Role name granting full administrative access.
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
    /// Role name granting instructor access (verify only).
    #[serde(default = "default_instructor_role")]
    pub instructor_role: String,
    /// Role name assigned by the verify command.
    #[serde(default = "default_student_role")]
    pub student_role: String,
}

/// Chat-completion backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

/// Keep-alive web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_port")]
    pub port: u16,
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
    /// Seconds between self-pings; 0 disables the ping task.
    #[serde(default = "default_self_ping_secs")]
    pub self_ping_secs: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            public_dir: default_public_dir(),
            self_ping_secs: default_self_ping_secs(),
        }
    }
}

fn default_admin_role() -> String {
    "Founder/Admin".to_string()
}

fn default_instructor_role() -> String {
    "Instructor".to_string()
}

fn default_student_role() -> String {
    "Students".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_web_port() -> u16 {
    3000
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_self_ping_secs() -> u64 {
    300
}
