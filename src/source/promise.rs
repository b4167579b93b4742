//! One-shot, future-like source
//!
//! A `Promise` settles exactly once through its `Resolver` (or through the
//! Rust future it was built from). Continuations are always delivered as
//! separate local tasks, never inside the call that registered them or
//! settled the promise. That keeps the promise's result out of the
//! synchronous part of a subscription.
//!
//! Delivery uses `tokio::task::spawn_local`, so registering on a settled
//! promise or settling one must happen inside a `tokio::task::LocalSet`.

use super::failure::Failure;
use super::traits::{AsyncSource, Settle, Thenable};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

enum PromiseState<T> {
    Pending(Vec<Settle<T>>),
    Settled(Result<T, Failure>),
}

/// The consumer side of a one-shot value.
pub struct Promise<T> {
    state: Rc<RefCell<PromiseState<T>>>,
}

/// The producer side. Consumed by settling.
pub struct Resolver<T> {
    state: Rc<RefCell<PromiseState<T>>>,
}

impl<T: Clone + 'static> Promise<T> {
    /// A pending promise and the resolver that settles it.
    pub fn new() -> (Self, Resolver<T>) {
        let state = Rc::new(RefCell::new(PromiseState::Pending(Vec::new())));
        (
            Self {
                state: Rc::clone(&state),
            },
            Resolver { state },
        )
    }

    pub fn resolved(value: T) -> Self {
        Self::settled(Ok(value))
    }

    pub fn rejected(failure: impl Into<Failure>) -> Self {
        Self::settled(Err(failure.into()))
    }

    fn settled(outcome: Result<T, Failure>) -> Self {
        Self {
            state: Rc::new(RefCell::new(PromiseState::Settled(outcome))),
        }
    }

    /// Drive `future` on the current `LocalSet` and settle with its output.
    ///
    /// The future keeps running even if every consumer loses interest.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, Failure>> + 'static,
    {
        let (promise, resolver) = Self::new();
        tokio::task::spawn_local(async move {
            resolver.settle(future.await);
        });
        promise
    }

    pub fn is_settled(&self) -> bool {
        matches!(*self.state.borrow(), PromiseState::Settled(_))
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: Clone + 'static> Resolver<T> {
    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    pub fn reject(self, failure: impl Into<Failure>) {
        self.settle(Err(failure.into()));
    }

    fn settle(self, outcome: Result<T, Failure>) {
        let waiting = {
            let mut state = self.state.borrow_mut();
            match std::mem::replace(&mut *state, PromiseState::Settled(outcome.clone())) {
                PromiseState::Pending(waiting) => waiting,
                PromiseState::Settled(previous) => {
                    *state = PromiseState::Settled(previous);
                    return;
                }
            }
        };
        for continuation in waiting {
            deliver(continuation, outcome.clone());
        }
    }
}

fn deliver<T: 'static>(continuation: Settle<T>, outcome: Result<T, Failure>) {
    tokio::task::spawn_local(async move {
        continuation(outcome);
    });
}

impl<T: Clone + 'static> Thenable<T> for Promise<T> {
    fn then(&self, on_settled: Settle<T>) {
        let mut state = self.state.borrow_mut();
        match &mut *state {
            PromiseState::Pending(waiting) => waiting.push(on_settled),
            PromiseState::Settled(outcome) => deliver(on_settled, outcome.clone()),
        }
    }
}

impl<T: Clone + 'static> AsyncSource<T> for Promise<T> {
    fn as_thenable(&self) -> Option<&dyn Thenable<T>> {
        Some(self)
    }

    fn describe(&self) -> String {
        "Promise".to_string()
    }
}
