use ort::Error as OrtError;
use std::io;

/// Represents the different types of errors that can occur while training or
/// running the emoji classifier.
///
/// No variant is fatal: a session that reports one of these stays usable.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// A label, feature vector or parameter was malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A persisted dataset snapshot could not be understood
    #[error("Format error: {0}")]
    Format(String),
    /// Prediction was requested before any example was added
    #[error("There are no examples in any class")]
    NoExamples,
    /// No frame could be read from the frame source
    #[error("Capture error: {0}")]
    Capture(String),
    /// Error occurred while loading or running the ONNX model
    #[error("Model error: {0}")]
    Model(String),
    /// Error occurred while reading or writing a dataset file
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::Model(err.to_string())
    }
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        ClassifierError::Format(err.to_string())
    }
}

impl From<io::Error> for ClassifierError {
    fn from(err: io::Error) -> Self {
        ClassifierError::Persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ClassifierError::NoExamples.to_string(),
            "There are no examples in any class"
        );
        assert_eq!(
            ClassifierError::InvalidInput("empty".into()).to_string(),
            "Invalid input: empty"
        );
    }

    #[test]
    fn test_json_errors_become_format_errors() {
        let err = serde_json::from_str::<Vec<f32>>("[\"a\"]").unwrap_err();
        assert!(matches!(ClassifierError::from(err), ClassifierError::Format(_)));
    }
}
