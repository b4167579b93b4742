//! Extended async: resolve asynchronous sources for polling readers
//!
//! A host that re-evaluates its bindings on demand (a template renderer, a
//! UI loop) cannot await a stream or a future. This crate sits in between:
//! an `AsyncResolver` subscribes to the binding's current source, caches
//! what it delivered, and answers every read synchronously from that cache.
//!
//! # Core Concepts
//!
//! - **Sources**: nothing, a stream-like `Subscribable`, or a future-like
//!   `Thenable`, probed once and subscribed uniformly
//! - **Fallbacks**: what a read returns while nothing has arrived or after
//!   the source failed, or `Sentinel` to fail fast instead
//! - **Change notification**: fired for state changes that happen after
//!   the read that subscribed, so the host knows to read again
//!
//! # Example
//!
//! ```
//! use extended_async::{AsyncResolver, Fallback, SourceRef, Subject};
//! use std::rc::Rc;
//!
//! let subject = Subject::new();
//! let source: SourceRef<i32> = Rc::new(subject.clone());
//! let mut resolver = AsyncResolver::new(|| println!("read again"));
//!
//! let first = resolver.read(Some(&source), Fallback::value(0), Fallback::UseDefault);
//! assert_eq!(first.unwrap(), Some(0));
//!
//! subject.next(5);
//! let second = resolver.read(Some(&source), Fallback::value(0), Fallback::UseDefault);
//! assert_eq!(second.unwrap(), Some(5));
//! ```

pub mod resolve;
pub mod source;

pub use resolve::{
    AsyncResolver, ChangeNotifier, Fallback, LatestState, ResolveError, ResolverConfig,
};
pub use source::{
    AsyncSource, CancellationToken, ClassificationError, Cold, Failure, Observer, Promise, Resolver,
    SourceRef, Subject, Subscribable, Subscription, Thenable,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
