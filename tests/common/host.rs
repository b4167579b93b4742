//! A minimal polling host for driving resolvers in tests

use extended_async::{AsyncResolver, AsyncSource, ResolverConfig, SourceRef};
use std::cell::Cell;
use std::rc::Rc;

/// A resolver plus a counter of change notifications it fired.
pub struct TestHost<T> {
    pub resolver: AsyncResolver<T>,
    notified: Rc<Cell<usize>>,
}

impl<T: Clone + PartialEq + 'static> TestHost<T> {
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::new().with_label("test"))
    }

    pub fn with_config(config: ResolverConfig<T>) -> Self {
        let notified = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notified);
        Self {
            resolver: AsyncResolver::with_config(move || counter.set(counter.get() + 1), config),
            notified,
        }
    }

    /// Notifications fired so far.
    pub fn notifications(&self) -> usize {
        self.notified.get()
    }
}

pub fn source_ref<T, S: AsyncSource<T> + 'static>(source: S) -> SourceRef<T> {
    Rc::new(source)
}
