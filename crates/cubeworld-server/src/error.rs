//! Error types for the session server.
//!
//! Only transport-level failures are Rust errors. Anything a client did
//! wrong is answered with one of the fixed JSON error objects and the
//! session carries on.

use std::net::SocketAddr;

/// Errors that can occur when starting or running the session server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured address could not be parsed.
    #[error("invalid listen address {addr}: {source}")]
    Address {
        /// The address as configured.
        addr: String,
        /// Underlying parse error.
        source: std::net::AddrParseError,
    },

    /// Failed to bind to the network address.
    #[error("bind failed on {addr}: {source}")]
    Bind {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A worker thread could not be started.
    #[error("failed to spawn worker {index}: {source}")]
    Spawn {
        /// Worker number.
        index: usize,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A socket operation failed.
    #[error("socket error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A response could not be serialized.
    #[error("encode error: {source}")]
    Encode {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
