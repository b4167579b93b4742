//! Source classification and uniform subscription
//!
//! Every source handed to a resolver is classified once, when it is first
//! seen, into a closed set of shapes. Each shape is then subscribed the same
//! way: values go to `on_value`, failures to `on_error`, and the caller gets
//! back a `Subscription` it owns.

use super::cancel::CancellationToken;
use super::failure::Failure;
use super::traits::{AsyncSource, Observer, Subscribable, Subscription, Thenable};
use thiserror::Error;

/// The source is neither empty, stream-like nor future-like.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{description}' is not a valid asynchronous data source")]
pub struct ClassificationError {
    /// What the source calls itself
    pub description: String,
}

/// The result of probing a source for its capabilities.
pub enum SourceShape<'a, T> {
    /// No source was provided
    Empty,
    /// Stream capability; wins over the one-shot capability
    Stream(&'a dyn Subscribable<T>),
    /// One-shot capability
    Future(&'a dyn Thenable<T>),
    /// No usable capability; carries the source's description
    Invalid(String),
}

impl<T> SourceShape<'_, T> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Stream(_) => "stream",
            Self::Future(_) => "future",
            Self::Invalid(_) => "invalid",
        }
    }
}

/// Probe a source. Streams are checked before futures.
pub fn classify<'a, T>(source: Option<&'a dyn AsyncSource<T>>) -> SourceShape<'a, T> {
    let Some(source) = source else {
        return SourceShape::Empty;
    };
    if let Some(stream) = source.as_subscribable() {
        return SourceShape::Stream(stream);
    }
    if let Some(future) = source.as_thenable() {
        return SourceShape::Future(future);
    }
    SourceShape::Invalid(source.describe())
}

/// Classify `source` and subscribe to it.
///
/// - Empty: `on_value(empty_value)` runs before this returns; the
///   subscription has nothing to tear down.
/// - Stream: subscribes directly; anything the stream emits synchronously
///   arrives before this returns.
/// - Future: registers a continuation fenced by a cancellation token; the
///   returned subscription cancels the token, turning a late result into
///   a no-op.
/// - Invalid: fails immediately, nothing is subscribed.
pub fn classify_and_subscribe<T: 'static>(
    source: Option<&dyn AsyncSource<T>>,
    on_value: impl Fn(Option<T>) + 'static,
    on_error: impl Fn(Failure) + 'static,
    empty_value: Option<T>,
) -> Result<Subscription, ClassificationError> {
    let shape = classify(source);
    tracing::trace!(shape = shape.kind(), "subscribing to source");

    match shape {
        SourceShape::Empty => {
            on_value(empty_value);
            Ok(Subscription::empty())
        }
        SourceShape::Stream(stream) => {
            let observer = Observer::new(move |value| on_value(Some(value)), on_error);
            Ok(stream.subscribe(observer))
        }
        SourceShape::Future(future) => {
            let token = CancellationToken::new();
            let live = token.clone();
            future.then(Box::new(move |outcome| {
                if live.is_cancelled() {
                    tracing::trace!("discarding outcome of a disposed future");
                    return;
                }
                match outcome {
                    Ok(value) => on_value(Some(value)),
                    Err(failure) => on_error(failure),
                }
            }));
            Ok(Subscription::from_token(token))
        }
        SourceShape::Invalid(description) => Err(ClassificationError { description }),
    }
}
