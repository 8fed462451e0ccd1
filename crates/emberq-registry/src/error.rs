// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the registry layer.

/// Errors returned by coordination and registry operations.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Connectivity Errors
    // ========================================================================
    /// Could not reach any configured coordination endpoint.
    Connection(String),
    /// I/O error on the coordination transport.
    Io(std::io::Error),
    /// A request did not receive a reply within the session timeout.
    Timeout(String),
    /// The session has been closed; no further operations are possible.
    SessionClosed,

    // ========================================================================
    // Namespace Errors
    // ========================================================================
    /// The node (or a required ancestor) does not exist.
    NoNode(String),
    /// The node already exists.
    NodeExists(String),
    /// The node is not empty (children present).
    NotEmpty(String),
    /// Conditional write failed: expected version did not match.
    BadVersion(String),

    // ========================================================================
    // Data Errors
    // ========================================================================
    /// Malformed wire frame or unexpected reply shape.
    Protocol(String),
    /// Binding payload could not be encoded or decoded.
    Codec(String),

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// Invalid configuration.
    Config(&'static str),
    /// The watch session's dispatch task has already been started.
    AlreadyDispatching(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Connection(msg) => write!(f, "Connection failed: {}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Timeout(msg) => write!(f, "Request timed out: {}", msg),
            Error::SessionClosed => write!(f, "Session closed"),
            Error::NoNode(path) => write!(f, "No such node: {}", path),
            Error::NodeExists(path) => write!(f, "Node already exists: {}", path),
            Error::NotEmpty(path) => write!(f, "Node not empty: {}", path),
            Error::BadVersion(path) => write!(f, "Version mismatch: {}", path),
            Error::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            Error::Codec(msg) => write!(f, "Codec error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::AlreadyDispatching(path) => {
                write!(f, "Dispatch task already started for: {}", path)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Result alias used throughout the registry layer.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NoNode("/emberq/server/trade".into());
        assert!(err.to_string().contains("/emberq/server/trade"));

        let err = Error::Connection("refused".into());
        assert!(err.to_string().contains("Connection failed"));

        let err = Error::SessionClosed;
        assert_eq!(err.to_string(), "Session closed");
    }

    #[test]
    fn test_io_error_source() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(std::error::Error::source(&err).is_some());
    }
}
