//! Source adapter layer
//!
//! Normalizes the three accepted source shapes (none, stream-like,
//! future-like) behind one subscription contract, and provides the concrete
//! sources a host usually needs.

mod cancel;
mod cold;
mod failure;
mod promise;
mod shape;
mod subject;
mod traits;

pub use cancel::CancellationToken;
pub use cold::Cold;
pub use failure::Failure;
pub use promise::{Promise, Resolver};
pub use shape::{classify, classify_and_subscribe, ClassificationError, SourceShape};
pub use subject::Subject;
pub use traits::{
    same_source, AsyncSource, Observer, Settle, SourceRef, Subscribable, Subscription, Thenable,
};
