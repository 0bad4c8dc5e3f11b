//! Utility functions for Latch
//!
//! Common helper functions used across the codebase.

use std::sync::LazyLock;

/// Regex pattern for validating identifiers (resource types, resource ids)
static VALID_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new("^[a-zA-Z0-9_.:-]+$").expect("Invalid regex pattern"));

/// Validate a string contains only allowed identifier characters
///
/// Allowed characters: alphanumeric, underscore, dot, colon, hyphen.
/// The empty string is not a valid identifier.
///
/// # Examples
///
/// ```
/// use latch_common::is_valid;
///
/// assert!(is_valid("blog.article"));
/// assert!(is_valid("user:42"));
/// assert!(!is_valid("invalid/path"));
/// assert!(!is_valid("with spaces"));
/// ```
pub fn is_valid(str: &str) -> bool {
    VALID_PATTERN.is_match(str)
}
