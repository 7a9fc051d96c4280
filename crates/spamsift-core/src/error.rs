//! Error types for spamsift

/// Result type alias using spamsift's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for spamsift operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No vectorizer candidate could be located and deserialized
    #[error("no usable vectorizer artifact found in {0}")]
    MissingExtractor(String),

    /// No model candidate could be located and deserialized
    #[error("no usable model artifact found in {0}")]
    MissingModel(String),

    /// The freshly loaded artifact pair failed its validation inference run
    #[error("artifact smoke test failed: {0}")]
    SmokeTestFailed(String),

    /// Vectorizer output width does not match the model's expected input width
    #[error("dimension mismatch: vectorizer produces {vectorizer} features, model expects {model}")]
    DimensionMismatch { vectorizer: usize, model: usize },

    /// Caller supplied blank or whitespace-only text
    #[error("empty input: message text is required")]
    EmptyInput,

    /// Unexpected failure during normalize/transform/predict for one request
    #[error("inference error: {0}")]
    Inference(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors while probing or reading artifacts
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new smoke-test error
    pub fn smoke_test(msg: impl Into<String>) -> Self {
        Self::SmokeTestFailed(msg.into())
    }

    /// Whether this error is fatal to serving readiness (load-time class)
    /// as opposed to local to a single request.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingExtractor(_)
                | Self::MissingModel(_)
                | Self::SmokeTestFailed(_)
                | Self::DimensionMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failure_classification() {
        assert!(Error::MissingExtractor("models".into()).is_load_failure());
        assert!(Error::MissingModel("models".into()).is_load_failure());
        assert!(Error::smoke_test("boom").is_load_failure());
        assert!(Error::DimensionMismatch {
            vectorizer: 10,
            model: 20
        }
        .is_load_failure());

        assert!(!Error::EmptyInput.is_load_failure());
        assert!(!Error::inference("per-request").is_load_failure());
        assert!(!Error::config("bad yaml").is_load_failure());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::DimensionMismatch {
            vectorizer: 8000,
            model: 5000,
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch: vectorizer produces 8000 features, model expects 5000"
        );

        let err = Error::MissingModel("./models".into());
        assert!(err.to_string().contains("./models"));
    }
}
