//! Core types for spamsift

use serde::{Deserialize, Serialize};

/// Binary classification label. Spam is the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    /// Uppercase wire name used in the serving response
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ham => "HAM",
            Self::Spam => "SPAM",
        }
    }

    pub fn is_spam(&self) -> bool {
        matches!(self, Self::Spam)
    }
}

/// Result of a single classification, produced by the inference stage.
///
/// Probabilities are expressed on a 0..100 scale. When both come from a
/// single probability distribution they sum to 100 up to rounding.
#[derive(Debug, Clone)]
pub struct PredictionResult {
    /// Predicted label
    pub label: Label,

    /// Probability the message is legitimate (0..100)
    pub ham_probability: f32,

    /// Probability the message is spam (0..100)
    pub spam_probability: f32,

    /// The larger of the two probabilities (0..100)
    pub confidence: f32,

    /// Inference latency in microseconds
    pub latency_us: u64,
}

impl PredictionResult {
    /// Create a result from a label and probability pair, deriving confidence.
    pub fn new(label: Label, ham_probability: f32, spam_probability: f32) -> Self {
        Self {
            label,
            ham_probability,
            spam_probability,
            confidence: ham_probability.max(spam_probability),
            latency_us: 0,
        }
    }
}

/// The stable response contract exposed to the serving façade.
///
/// Every classification call produces one of these, including degraded and
/// error outcomes; callers never observe a transport-level failure from the
/// pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// "SPAM", "HAM", "ERROR", or "INVALID"
    pub prediction: String,

    /// Confidence score (0..100)
    pub confidence: f32,

    /// Ham probability (0..100)
    pub ham_probability: f32,

    /// Spam probability (0..100)
    pub spam_probability: f32,

    /// Whether the message was classified as spam
    pub is_spam: bool,

    /// Diagnostic message for ERROR/INVALID outcomes
    pub error: Option<String>,
}

impl PredictionResponse {
    /// Successful classification
    pub fn ok(result: &PredictionResult) -> Self {
        Self {
            prediction: result.label.as_str().to_string(),
            confidence: round2(result.confidence),
            ham_probability: round2(result.ham_probability),
            spam_probability: round2(result.spam_probability),
            is_spam: result.label.is_spam(),
            error: None,
        }
    }

    /// Caller supplied blank or missing text
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::zeroed("INVALID", message)
    }

    /// The pipeline is degraded; no artifacts are loaded
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::zeroed("ERROR", reason)
    }

    /// A request-scoped inference failure
    pub fn failure(message: impl Into<String>) -> Self {
        Self::zeroed("ERROR", message)
    }

    fn zeroed(prediction: &str, error: impl Into<String>) -> Self {
        Self {
            prediction: prediction.to_string(),
            confidence: 0.0,
            ham_probability: 0.0,
            spam_probability: 0.0,
            is_spam: false,
            error: Some(error.into()),
        }
    }
}

/// Round to two decimal places for the wire contract.
fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_names() {
        assert_eq!(Label::Spam.as_str(), "SPAM");
        assert_eq!(Label::Ham.as_str(), "HAM");
        assert!(Label::Spam.is_spam());
        assert!(!Label::Ham.is_spam());
    }

    #[test]
    fn test_confidence_is_max_probability() {
        let result = PredictionResult::new(Label::Spam, 12.5, 87.5);
        assert_eq!(result.confidence, 87.5);

        let result = PredictionResult::new(Label::Ham, 99.0, 1.0);
        assert_eq!(result.confidence, 99.0);
    }

    #[test]
    fn test_ok_response_rounds_probabilities() {
        let result = PredictionResult::new(Label::Spam, 12.3456, 87.6544);
        let response = PredictionResponse::ok(&result);

        assert_eq!(response.prediction, "SPAM");
        assert!(response.is_spam);
        assert_eq!(response.ham_probability, 12.35);
        assert_eq!(response.spam_probability, 87.65);
        assert!(response.error.is_none());
        assert!((response.ham_probability + response.spam_probability - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_error_responses_are_zeroed() {
        let response = PredictionResponse::invalid("message text is required");
        assert_eq!(response.prediction, "INVALID");
        assert_eq!(response.confidence, 0.0);
        assert!(!response.is_spam);
        assert!(response.error.is_some());

        let response = PredictionResponse::unavailable("artifacts not loaded");
        assert_eq!(response.prediction, "ERROR");
        assert_eq!(response.error.as_deref(), Some("artifacts not loaded"));
    }

    #[test]
    fn test_response_serializes_error_as_null() {
        let result = PredictionResult::new(Label::Ham, 75.0, 25.0);
        let json = serde_json::to_value(PredictionResponse::ok(&result)).unwrap();

        assert_eq!(json["prediction"], "HAM");
        assert_eq!(json["is_spam"], false);
        assert!(json["error"].is_null());
    }
}
