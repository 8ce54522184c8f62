//! Error types for cloudfeat

use thiserror::Error;

/// Main error type for cloudfeat operations
#[derive(Error, Debug)]
pub enum Error {
    /// A scalar field, normals or colors required by a feature are absent
    #[error("{0}")]
    MissingPrerequisite(String),

    /// Stored data disagrees with itself (e.g. field length vs. cloud size)
    #[error("{0}")]
    InconsistentData(String),

    #[error("Not enough memory")]
    NotEnoughMemory,

    #[error("Process cancelled")]
    Cancelled,

    #[error("Invalid feature: {0}")]
    InvalidDescriptor(String),

    /// Caller broke an API contract (unknown cloud, mismatched lengths, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not implemented: {0}")]
    Unimplemented(String),

    #[error("Failed to extract stat. from field '{field}' @ scale {scale}")]
    StatExtraction {
        field: String,
        scale: f64,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to perform the MATH operation: {0}")]
    MathOperation(Box<Error>),
}

impl Error {
    /// Whether this error (or the error it wraps) is a user cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::StatExtraction { source, .. } => source.is_cancelled(),
            Error::MathOperation(inner) => inner.is_cancelled(),
            _ => false,
        }
    }
}

/// Result type alias for cloudfeat operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_detected_through_wrappers() {
        let err = Error::StatExtraction {
            field: "Intensity".to_string(),
            scale: 2.0,
            source: Box::new(Error::Cancelled),
        };
        assert!(err.is_cancelled());
        assert_eq!(
            err.to_string(),
            "Failed to extract stat. from field 'Intensity' @ scale 2"
        );
        assert!(!Error::NotEnoughMemory.is_cancelled());
    }
}
