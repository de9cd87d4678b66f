//! Error kinds for wikirace operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on the kind to decide whether a failure ends a single run
/// gracefully or aborts the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Missing or invalid configuration (e.g. absent API key)
    ConfigInvalid,

    /// Invalid argument passed to function
    InvalidArgument,

    // =========================================================================
    // Transport errors
    // =========================================================================
    /// Connection or transfer failure
    NetworkFailed,

    /// Server answered with a non-success status
    HttpStatus,

    /// Operation did not finish within its time bound
    Timeout,

    // =========================================================================
    // Inference/LLM errors
    // =========================================================================
    /// LLM inference failed
    InferenceFailed,

    /// Rate limit exceeded
    RateLimited,

    /// Credentials rejected by the provider
    PermissionDenied,

    // =========================================================================
    // Misc
    // =========================================================================
    /// Failed to parse input or a response body
    ParseFailed,

    /// Local IO failed (stdin, stdout)
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",

            ErrorKind::NetworkFailed => "NetworkFailed",
            ErrorKind::HttpStatus => "HttpStatus",
            ErrorKind::Timeout => "Timeout",

            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::PermissionDenied => "PermissionDenied",

            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::IoFailed => "IoFailed",
        }
    }

    /// Check if this error kind is transient by nature.
    ///
    /// Nothing in wikirace retries; the flag only classifies the error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::NetworkFailed
                | ErrorKind::Timeout
                | ErrorKind::RateLimited
                | ErrorKind::InferenceFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::Timeout.to_string(), "Timeout");
        assert_eq!(ErrorKind::InferenceFailed.to_string(), "InferenceFailed");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::NetworkFailed.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::ConfigInvalid.is_retryable());
        assert!(!ErrorKind::HttpStatus.is_retryable());
    }
}
