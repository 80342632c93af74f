//! Error types for the HTTP server.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::routing::RegistryError;

/// Errors that can occur during HTTP server setup and operation.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The listening socket could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// A route or API version could not be registered.
    #[error("Registration failed: {0}")]
    Registry(#[from] RegistryError),

    /// A response did not finish writing in time.
    #[error("Write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
