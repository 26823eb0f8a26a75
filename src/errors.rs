#![allow(dead_code)]

use thiserror::Error;

/// Typed error hierarchy for nonnobot.
///
/// Used at module boundaries (config validation, provider calls, channel sends).
/// Internal/leaf functions can continue using `anyhow::Result`; the `Internal`
/// variant converts via the `?` operator.
#[derive(Debug, Error)]
pub enum NonnoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Completion API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Completion API returned no usable text")]
    EmptyCompletion,

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl NonnoError {
    /// Whether this error must abort startup (only configuration errors are fatal;
    /// everything else degrades to a skipped reply).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = NonnoError::Config("RATE_LIMIT_MESSAGES must be at least 1".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: RATE_LIMIT_MESSAGES must be at least 1"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn api_error_display() {
        let err = NonnoError::Api {
            status: 502,
            message: "bad gateway".into(),
        };
        assert_eq!(
            err.to_string(),
            "Completion API error (status 502): bad gateway"
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn missing_credential_display() {
        let err = NonnoError::MissingCredential("OPENROUTER_API_KEY");
        assert_eq!(err.to_string(), "Missing credential: OPENROUTER_API_KEY");
    }

    #[test]
    fn internal_from_anyhow() {
        let err: NonnoError = anyhow::anyhow!("something broke").into();
        assert!(matches!(err, NonnoError::Internal(_)));
        assert!(!err.is_fatal());
    }
}
