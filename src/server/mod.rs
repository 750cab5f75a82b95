//! High-level server API
//!
//! Provides a simplified gateway building interface for common use cases.

mod builder;

pub use builder::{Server, ServerBuilder};
