//! Common type definitions used across the codebase.

pub mod types;

pub use types::{sort_by_offset, Position, Warn};
