//! Errors surfaced by a read

use crate::source::{ClassificationError, Failure};
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned from `AsyncResolver::read`.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The source could not be classified. Always surfaced.
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    /// Fail-fast no-value fallback and nothing observed yet.
    #[error("asynchronous data source did not emit a value, but no initial value is specified")]
    MissingInitialValue,

    /// Fail-fast error fallback and the source failed with a non-error payload.
    #[error("asynchronous data source emitted an error, cause: {cause}")]
    SourceFailed { cause: Failure },

    /// Fail-fast error fallback and the source failed with a native error.
    #[error(transparent)]
    Source(Arc<dyn Error + Send + Sync>),
}

impl ResolveError {
    /// Native errors pass through; other payloads are wrapped.
    pub(crate) fn from_failure(failure: Failure) -> Self {
        match failure {
            Failure::Error(err) => Self::Source(err),
            payload @ Failure::Payload(_) => Self::SourceFailed { cause: payload },
        }
    }

    /// True for both flavours of source failure.
    pub fn is_source_failure(&self) -> bool {
        matches!(self, Self::SourceFailed { .. } | Self::Source(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn native_error_keeps_its_message() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "oops");
        let err = ResolveError::from_failure(Failure::error(io));

        assert!(matches!(err, ResolveError::Source(_)));
        assert_eq!(err.to_string(), "oops");
    }

    #[test]
    fn payload_is_wrapped_with_cause() {
        let err = ResolveError::from_failure(Failure::payload(json!("paf")));

        match &err {
            ResolveError::SourceFailed { cause } => assert_eq!(cause.to_string(), "paf"),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "asynchronous data source emitted an error, cause: paf"
        );
        assert!(err.is_source_failure());
    }

    #[test]
    fn classification_is_not_a_source_failure() {
        let err = ResolveError::from(ClassificationError {
            description: "bad input".to_string(),
        });
        assert!(!err.is_source_failure());
        assert_eq!(err.to_string(), "'bad input' is not a valid asynchronous data source");
    }
}
