//! Error types for API client operations.
//!
//! Errors are categorized so callers can tell a missing remote object apart
//! from a transport problem without inspecting message strings.

use std::fmt;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request never produced an HTTP response.
    Network,
    /// The service answered 404.
    NotFound,
    /// The service answered with another non-200 status.
    Api,
    /// A body could not be encoded or decoded.
    Format,
    /// The request itself was malformed.
    Request,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Remote object not found",
            Self::Api => "API rejected the request",
            Self::Format => "Invalid payload",
            Self::Request => "Invalid request",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check the API URL and your connection, then try again",
            Self::NotFound => "The object may have been deleted outside of cfsync",
            Self::Api => "Check the token and the request payload",
            Self::Format => "The API returned an unexpected payload",
            Self::Request => "Check the API URL and request path",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure: DNS, connect, TLS, broken body.
    #[error("request to {url} failed: {message}")]
    Network {
        /// Full request URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The service answered with a status other than 200.
    ///
    /// The body is carried verbatim; it is not parsed.
    #[error("{status_line}, {body}")]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// Status line such as `404 Not Found`.
        status_line: String,
        /// Raw response body.
        body: String,
    },

    /// A value could not be serialized to JSON.
    #[error("failed to encode JSON: {0}")]
    Encode(String),

    /// A response body could not be deserialized.
    #[error("failed to decode JSON: {0}")]
    Decode(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A create call returned nothing usable.
    #[error("empty response from {0}")]
    EmptyResponse(String),
}

impl Error {
    /// Create a network error.
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a status error from its parts.
    pub fn status(status: u16, reason: &str, body: impl Into<String>) -> Self {
        let status_line = if reason.is_empty() {
            status.to_string()
        } else {
            format!("{status} {reason}")
        };
        Self::Status {
            status,
            status_line,
            body: body.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::Status { status: 404, .. } => ErrorCategory::NotFound,
            Error::Status { .. } => ErrorCategory::Api,
            Error::Encode(_) | Error::Decode(_) | Error::EmptyResponse(_) => ErrorCategory::Format,
            Error::InvalidRequest(_) => ErrorCategory::Request,
        }
    }

    /// Whether the service reported the object as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display_keeps_body_verbatim() {
        let err = Error::status(404, "Not Found", r#"{"message":"not found"}"#);
        assert_eq!(err.to_string(), r#"404 Not Found, {"message":"not found"}"#);
    }

    #[test]
    fn test_status_without_reason() {
        let err = Error::status(599, "", "boom");
        assert_eq!(err.to_string(), "599, boom");
    }

    #[test]
    fn test_not_found_category() {
        let err = Error::status(404, "Not Found", "");
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.is_not_found());

        let err = Error::status(500, "Internal Server Error", "");
        assert_eq!(err.category(), ErrorCategory::Api);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_network_category() {
        let err = Error::network("https://example.com/x", "connection refused");
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_category_text() {
        assert!(!ErrorCategory::Network.description().is_empty());
        assert!(!ErrorCategory::NotFound.advice().is_empty());
        assert!(format!("{}", ErrorCategory::Api).contains("API"));
    }
}
