//! Configuration parsing and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

pub use types::Config;

use crate::common::error::ConfigResult;

/// Load a config file, apply environment overrides, and validate the result.
pub fn load_and_validate(path: &str) -> ConfigResult<Config> {
    let config = parser::load_config(path)?;
    let config = env::apply_env_overrides(config);
    validate::validate_config(&config)?;
    Ok(config)
}
