//! Error types for route and version registration.

use thiserror::Error;

use crate::parser::Method;

/// Setup-time registration failures. Never reach network clients.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A versioned route or an API version was registered with versioning off.
    #[error("API versioning is disabled")]
    VersioningDisabled,

    /// An API version with the same id is already registered.
    #[error("API version already exists: {0}")]
    VersionAlreadyExists(String),

    /// Routes cannot be registered for this method.
    #[error("Unsupported request method: {0}")]
    UnsupportedMethod(Method),

    /// The route names an API version that was never registered.
    #[error("API version does not exist: {0}")]
    UnknownApiVersion(String),
}
