//! Common test utilities for resolver integration tests

pub mod host;

pub use host::{source_ref, TestHost};
