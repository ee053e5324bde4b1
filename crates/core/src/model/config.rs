use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("session size must be > 0")]
    InvalidSessionSize,

    #[error("seconds per question must be > 0")]
    InvalidSecondsPerQuestion,
}

/// Per-session quiz settings supplied when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    session_size: u32,
    seconds_per_question: u32,
}

impl SessionConfig {
    pub const DEFAULT_SESSION_SIZE: u32 = 3;
    pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 60;

    /// Creates a validated session configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if either value is zero.
    pub fn new(session_size: u32, seconds_per_question: u32) -> Result<Self, ConfigError> {
        if session_size == 0 {
            return Err(ConfigError::InvalidSessionSize);
        }
        if seconds_per_question == 0 {
            return Err(ConfigError::InvalidSecondsPerQuestion);
        }
        Ok(Self {
            session_size,
            seconds_per_question,
        })
    }

    /// Number of questions drawn for a session (K).
    #[must_use]
    pub fn session_size(&self) -> u32 {
        self.session_size
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    /// Re-check values that may have arrived through deserialization.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if either value is zero.
    pub fn validate(self) -> Result<Self, ConfigError> {
        Self::new(self.session_size, self.seconds_per_question)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_size: Self::DEFAULT_SESSION_SIZE,
            seconds_per_question: Self::DEFAULT_SECONDS_PER_QUESTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_quick_quiz() {
        let config = SessionConfig::default();
        assert_eq!(config.session_size(), 3);
        assert_eq!(config.seconds_per_question(), 60);
    }

    #[test]
    fn rejects_zero_values() {
        assert_eq!(
            SessionConfig::new(0, 60).unwrap_err(),
            ConfigError::InvalidSessionSize
        );
        assert_eq!(
            SessionConfig::new(3, 0).unwrap_err(),
            ConfigError::InvalidSecondsPerQuestion
        );
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"session_size": 5}"#).unwrap();
        assert_eq!(config.session_size(), 5);
        assert_eq!(config.seconds_per_question(), 60);
        assert!(config.validate().is_ok());
    }
}
