//! Source capabilities: the contracts an asynchronous source can offer
//!
//! A source is probed for capabilities rather than inspected for its type.
//! Stream-like sources deliver zero or more values (or one failure) to an
//! observer until unsubscribed. Future-like sources settle exactly once and
//! cannot be cancelled, only ignored.

use super::cancel::CancellationToken;
use super::failure::Failure;
use std::fmt;
use std::rc::Rc;

/// The continuation a future-like source settles exactly once.
pub type Settle<T> = Box<dyn FnOnce(Result<T, Failure>)>;

/// Shared handle to a source, compared by identity.
pub type SourceRef<T> = Rc<dyn AsyncSource<T>>;

/// Anything that can be handed to a resolver as its current source.
///
/// Implementors advertise what they can do through the capability probes.
/// A type that answers `None` to both is not a valid source and is
/// rejected when the resolver tries to subscribe to it.
pub trait AsyncSource<T> {
    /// Stream capability probe
    fn as_subscribable(&self) -> Option<&dyn Subscribable<T>> {
        None
    }

    /// One-shot capability probe
    fn as_thenable(&self) -> Option<&dyn Thenable<T>> {
        None
    }

    /// Human-readable name used in classification errors.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Identity comparison of two source handles.
///
/// Only the data pointer is compared; vtable pointers of the same type can
/// differ between codegen units.
pub fn same_source<T>(a: &SourceRef<T>, b: &SourceRef<T>) -> bool {
    Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
}

/// An open-ended stream of values that ends at most once with a failure.
pub trait Subscribable<T> {
    /// Start delivering to `observer`. Values already available may be
    /// delivered before this returns.
    fn subscribe(&self, observer: Observer<T>) -> Subscription;
}

/// A value that resolves or rejects exactly once.
pub trait Thenable<T> {
    /// Register a continuation. It runs once the source settles, never
    /// during this call.
    fn then(&self, on_settled: Settle<T>);
}

/// The pair of callbacks a stream delivers into.
pub struct Observer<T> {
    next: Rc<dyn Fn(T)>,
    error: Rc<dyn Fn(Failure)>,
}

impl<T> Observer<T> {
    pub fn new(next: impl Fn(T) + 'static, error: impl Fn(Failure) + 'static) -> Self {
        Self {
            next: Rc::new(next),
            error: Rc::new(error),
        }
    }

    pub fn next(&self, value: T) {
        (self.next)(value)
    }

    pub fn error(&self, failure: Failure) {
        (self.error)(failure)
    }
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            next: Rc::clone(&self.next),
            error: Rc::clone(&self.error),
        }
    }
}

impl<T> fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").finish_non_exhaustive()
    }
}

/// Handle to a live subscription.
///
/// `unsubscribe()` runs the teardown at most once. Dropping the handle
/// unsubscribes, so it has to be held for as long as delivery is wanted.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// A subscription whose teardown cancels `token`.
    pub fn from_token(token: CancellationToken) -> Self {
        Self::new(move || token.cancel())
    }

    pub fn unsubscribe(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.teardown.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Inert;

    impl AsyncSource<u8> for Inert {}

    #[test]
    fn unsubscribe_runs_teardown_once() {
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let mut sub = Subscription::new(move || counter.set(counter.get() + 1));

        assert!(!sub.is_closed());
        sub.unsubscribe();
        sub.unsubscribe();
        drop(sub);

        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn drop_unsubscribes() {
        let token = CancellationToken::new();
        {
            let _sub = Subscription::from_token(token.clone());
            assert!(!token.is_cancelled());
        }
        assert!(token.is_cancelled());
    }

    #[test]
    fn inert_source_has_no_capabilities() {
        let source: SourceRef<u8> = Rc::new(Inert);
        assert!(source.as_subscribable().is_none());
        assert!(source.as_thenable().is_none());
        assert!(source.describe().ends_with("Inert"));
    }

    #[test]
    fn identity_is_per_allocation() {
        let a: SourceRef<u8> = Rc::new(Inert);
        let b: SourceRef<u8> = Rc::new(Inert);
        let a2 = Rc::clone(&a);

        assert!(same_source(&a, &a2));
        assert!(!same_source(&a, &b));
    }
}
