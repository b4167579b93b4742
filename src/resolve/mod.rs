//! Value resolution engine
//!
//! Caches the latest state of the current source, swaps sources on demand,
//! and resolves each read to a value, a fallback, or a fail-fast error.

mod config;
mod engine;
mod error;
mod fallback;


pub use config::ResolverConfig;
pub use engine::{AsyncResolver, ChangeNotifier, LatestState};
pub use error::ResolveError;
pub use fallback::Fallback;
