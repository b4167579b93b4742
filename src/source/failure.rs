//! Failure payloads carried by the error channel of a source

use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// What a source reports when it fails.
///
/// Sources may fail with a real error value or with any other payload
/// (a bare string, a number, a structured object). The two are kept apart
/// because they surface differently: a native error is re-raised unchanged,
/// everything else is wrapped and kept as the cause.
#[derive(Debug, Clone)]
pub enum Failure {
    /// A native error value
    Error(Arc<dyn Error + Send + Sync>),
    /// An arbitrary, non-error payload
    Payload(Value),
}

impl Failure {
    pub fn error<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::Error(Arc::new(err))
    }

    pub fn payload(value: impl Into<Value>) -> Self {
        Self::Payload(value.into())
    }

    /// True if this failure wraps a native error value.
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<Value> for Failure {
    fn from(value: Value) -> Self {
        Self::Payload(value)
    }
}

/// Native errors compare by identity, payloads by value.
impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Error(a), Self::Error(b)) => Arc::ptr_eq(a, b),
            (Self::Payload(a), Self::Payload(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(err) => write!(f, "{}", err),
            // Strings print bare, everything else as JSON
            Self::Payload(Value::String(s)) => write!(f, "{}", s),
            Self::Payload(other) => write!(f, "{}", other),
        }
    }
}
