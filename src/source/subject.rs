//! Hot, multicast stream source
//!
//! A `Subject` is pushed to by its owner and delivers every value to the
//! observers subscribed at that moment. A replaying subject also buffers
//! every value and hands the buffer to each new subscriber before
//! returning from `subscribe`.

use super::failure::Failure;
use super::traits::{AsyncSource, Observer, Subscribable, Subscription};
use std::cell::RefCell;
use std::rc::Rc;

struct SubjectState<T> {
    observers: Vec<(u64, Observer<T>)>,
    next_id: u64,
    subscriptions: usize,
    replay: Option<Vec<T>>,
    failure: Option<Failure>,
}

/// A stream source driven by its owner through `next` and `error`.
///
/// Clones share the same stream. After `error` the subject is terminated:
/// further values are dropped and late subscribers receive the failure
/// synchronously.
pub struct Subject<T> {
    state: Rc<RefCell<SubjectState<T>>>,
}

impl<T: Clone + 'static> Subject<T> {
    pub fn new() -> Self {
        Self::with_replay(None)
    }

    /// A subject that replays every value it has seen to new subscribers.
    pub fn replay() -> Self {
        Self::with_replay(Some(Vec::new()))
    }

    fn with_replay(replay: Option<Vec<T>>) -> Self {
        Self {
            state: Rc::new(RefCell::new(SubjectState {
                observers: Vec::new(),
                next_id: 0,
                subscriptions: 0,
                replay,
                failure: None,
            })),
        }
    }

    /// Deliver a value to every current observer.
    pub fn next(&self, value: T) {
        let observers: Vec<Observer<T>> = {
            let mut state = self.state.borrow_mut();
            if state.failure.is_some() {
                return;
            }
            if let Some(buffer) = state.replay.as_mut() {
                buffer.push(value.clone());
            }
            state.observers.iter().map(|(_, o)| o.clone()).collect()
        };
        // Borrow released: observers may subscribe or unsubscribe re-entrantly
        for observer in observers {
            observer.next(value.clone());
        }
    }

    /// Terminate the stream with a failure.
    pub fn error(&self, failure: Failure) {
        let observers = {
            let mut state = self.state.borrow_mut();
            if state.failure.is_some() {
                return;
            }
            state.failure = Some(failure.clone());
            std::mem::take(&mut state.observers)
        };
        for (_, observer) in observers {
            observer.error(failure.clone());
        }
    }

    /// Observers currently subscribed.
    pub fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    /// Subscriptions ever made, including closed ones.
    pub fn subscription_count(&self) -> usize {
        self.state.borrow().subscriptions
    }

    pub fn has_failed(&self) -> bool {
        self.state.borrow().failure.is_some()
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: Clone + 'static> Subscribable<T> for Subject<T> {
    fn subscribe(&self, observer: Observer<T>) -> Subscription {
        let (buffered, failure) = {
            let mut state = self.state.borrow_mut();
            state.subscriptions += 1;
            (state.replay.clone().unwrap_or_default(), state.failure.clone())
        };

        for value in buffered {
            observer.next(value);
        }
        if let Some(failure) = failure {
            observer.error(failure);
            return Subscription::empty();
        }

        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.observers.push((id, observer));
            id
        };

        let state = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().observers.retain(|(oid, _)| *oid != id);
            }
        })
    }
}

impl<T: Clone + 'static> AsyncSource<T> for Subject<T> {
    fn as_subscribable(&self) -> Option<&dyn Subscribable<T>> {
        Some(self)
    }

    fn describe(&self) -> String {
        "Subject".to_string()
    }
}
