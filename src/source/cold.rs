//! Cold stream sources
//!
//! Each subscriber gets its own, fully synchronous run: everything a cold
//! source has to say is delivered before `subscribe` returns.

use super::failure::Failure;
use super::traits::{AsyncSource, Observer, Subscribable, Subscription};
use std::cell::Cell;

enum Behavior<T> {
    Of(Vec<T>),
    Fail(Failure),
    Never,
}

/// A stream source that replays a fixed script to every subscriber.
pub struct Cold<T> {
    behavior: Behavior<T>,
    subscriptions: Cell<usize>,
}

impl<T: Clone + 'static> Cold<T> {
    /// Emits `values` in order on subscribe.
    pub fn of(values: impl IntoIterator<Item = T>) -> Self {
        Self::with(Behavior::Of(values.into_iter().collect()))
    }

    /// Fails on subscribe.
    pub fn fail(failure: impl Into<Failure>) -> Self {
        Self::with(Behavior::Fail(failure.into()))
    }

    /// Never emits.
    pub fn never() -> Self {
        Self::with(Behavior::Never)
    }

    fn with(behavior: Behavior<T>) -> Self {
        Self {
            behavior,
            subscriptions: Cell::new(0),
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.get()
    }
}

impl<T: Clone + 'static> Subscribable<T> for Cold<T> {
    fn subscribe(&self, observer: Observer<T>) -> Subscription {
        self.subscriptions.set(self.subscriptions.get() + 1);
        match &self.behavior {
            Behavior::Of(values) => {
                for value in values {
                    observer.next(value.clone());
                }
            }
            Behavior::Fail(failure) => observer.error(failure.clone()),
            Behavior::Never => {}
        }
        Subscription::empty()
    }
}

impl<T: Clone + 'static> AsyncSource<T> for Cold<T> {
    fn as_subscribable(&self) -> Option<&dyn Subscribable<T>> {
        Some(self)
    }

    fn describe(&self) -> String {
        let kind = match self.behavior {
            Behavior::Of(_) => "of",
            Behavior::Fail(_) => "fail",
            Behavior::Never => "never",
        };
        format!("Cold::{}", kind)
    }
}
