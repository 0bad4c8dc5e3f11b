//! Error types and error codes for Latch
//!
//! This module defines:
//! - `LatchError`: Application-specific error enum
//! - `ErrorCode`: Structured error codes for API responses

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum LatchError {
    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

impl ErrorCode<'_> {
    pub const ILLEGAL_ARGUMENT: ErrorCode<'static> = ErrorCode {
        code: 400,
        message: "parameter missing or invalid",
    };

    pub const UNAUTHORIZED: ErrorCode<'static> = ErrorCode {
        code: 401,
        message: "caller identity or permission missing",
    };

    pub const LEASE_HELD: ErrorCode<'static> = ErrorCode {
        code: 403,
        message: "lease is held by another actor",
    };

    pub const RESOURCE_TYPE_UNKNOWN: ErrorCode<'static> = ErrorCode {
        code: 404,
        message: "resource type is not mapped",
    };

    pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
        code: 500,
        message: "server error",
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_error_display() {
        let err = LatchError::IllegalArgument("bad resource id".to_string());
        assert_eq!(err.to_string(), "caused: bad resource id");

        let err = LatchError::StorageError("connection refused".to_string());
        assert_eq!(err.to_string(), "storage error: connection refused");
    }

    #[test]
    fn test_error_code_serializes() {
        let json = serde_json::to_value(ErrorCode::LEASE_HELD).unwrap();
        assert_eq!(json["code"], 403);
        assert_eq!(json["message"], "lease is held by another actor");
    }
}
