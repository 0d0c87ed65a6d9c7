//! Conversation behavior configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Tunables for the intake dialogue itself.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Seconds of silence before a returning caller starts over.
    #[serde(default = "default_inactivity_window_secs")]
    pub inactivity_window_secs: u64,

    /// Number of history entries (user + assistant) kept on the session
    /// for provider context.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Longest inbound utterance processed per turn, in characters.
    /// Longer input is truncated before extraction.
    #[serde(default = "default_max_utterance_len")]
    pub max_utterance_len: usize,
}

impl ConversationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.inactivity_window_secs < 60 {
            return Err(ValidationError::InactivityWindowTooShort);
        }
        if self.history_window < 2 {
            return Err(ValidationError::HistoryWindowTooSmall);
        }
        if self.max_utterance_len == 0 {
            return Err(ValidationError::InvalidUtteranceLimit);
        }
        Ok(())
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            inactivity_window_secs: default_inactivity_window_secs(),
            history_window: default_history_window(),
            max_utterance_len: default_max_utterance_len(),
        }
    }
}

fn default_inactivity_window_secs() -> u64 {
    // 30 minutes
    1800
}

fn default_history_window() -> usize {
    8
}

fn default_max_utterance_len() -> usize {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ConversationConfig::default();
        assert_eq!(config.inactivity_window_secs, 1800);
        assert_eq!(config.history_window, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_tiny_inactivity_window() {
        let config = ConversationConfig {
            inactivity_window_secs: 5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InactivityWindowTooShort)
        ));
    }

    #[test]
    fn rejects_history_window_below_one_turn() {
        let config = ConversationConfig {
            history_window: 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::HistoryWindowTooSmall)
        ));
    }

    #[test]
    fn rejects_zero_utterance_limit() {
        let config = ConversationConfig {
            max_utterance_len: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidUtteranceLimit)
        ));
    }
}
