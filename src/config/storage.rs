//! Storage configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Where session files live.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_session_dir")]
    pub session_dir: String,
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_dir.trim().is_empty() {
            return Err(ValidationError::EmptySessionDir);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            session_dir: default_session_dir(),
        }
    }
}

fn default_session_dir() -> String {
    "./data/sessions".to_string()
}
