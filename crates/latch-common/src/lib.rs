//! Latch Common - shared types and utilities
//!
//! This crate provides the foundational pieces used across the Latch
//! components:
//! - Error types and error codes
//! - Identifier validation helpers

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{ErrorCode, LatchError};
pub use utils::is_valid;
