//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `PRACTICE_INTAKE`
//! prefix with `__` separating nested values.
//!
//! # Example
//!
//! ```no_run
//! use practice_intake::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod cache;
mod conversation;
mod error;
mod storage;

pub use ai::AiConfig;
pub use cache::CacheConfig;
pub use conversation::ConversationConfig;
pub use error::{ConfigError, ValidationError};
pub use storage::StorageConfig;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Dialogue tunables (inactivity window, history window)
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Completion provider settings
    #[serde(default)]
    pub ai: AiConfig,

    /// Rephrased-reply cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Session persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads `.env` if present, then reads variables such as
    /// `PRACTICE_INTAKE__CONVERSATION__INACTIVITY_WINDOW_SECS=1800` and
    /// `PRACTICE_INTAKE__AI__API_KEY=sk-...`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PRACTICE_INTAKE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration sections.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.conversation.validate()?;
        self.ai.validate()?;
        self.cache.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_surfaces_section_errors() {
        let mut config = AppConfig::default();
        config.ai.enabled = true;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }
}
