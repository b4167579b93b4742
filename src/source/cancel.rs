//! Disposal fence for subscriptions that cannot be stopped at the producer
//!
//! A future-like source keeps running after its consumer loses interest,
//! and a misbehaving stream may keep emitting after `unsubscribe`. Every
//! continuation holds a clone of the subscription's token and checks it
//! before forwarding anything, so a disposed subscription turns late
//! deliveries into no-ops.

use std::cell::Cell;
use std::rc::Rc;

/// A shared "disposed" flag for one subscription.
///
/// Clones observe the same flag. Single-threaded, like the sources it
/// fences.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Mark the subscription disposed. There is no way back.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }
}
