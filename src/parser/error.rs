//! Error types for the HTTP parser.

use thiserror::Error;

use crate::server::StatusCode;

/// Failures produced while framing or parsing a request.
///
/// Every variant maps onto the status code that is sent back to the client,
/// see [`Error::status`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The buffered request or its declared `Content-Length` exceeds the size cap.
    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(u64),

    /// The request line or path is malformed or unsafe.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The HTTP method is not one of the supported methods.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// The protocol token is not `HTTP/1.0` or `HTTP/1.1`.
    #[error("HTTP version not supported: {0}")]
    HttpVersionNotSupported(String),

    /// More header fields than the configured limit.
    #[error("Too many header fields (limit {0})")]
    HeaderFieldsTooLarge(usize),

    /// No route is registered for the method and path.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request body could not be decoded as JSON.
    #[error("JSON parsing error: {0}")]
    Json(String),
}

impl Error {
    /// The status code a client receives for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::PayloadTooLarge(_) => StatusCode::PayloadTooLarge,
            Error::BadRequest(_) | Error::Json(_) => StatusCode::BadRequest,
            Error::MethodNotAllowed(_) => StatusCode::MethodNotAllowed,
            Error::HttpVersionNotSupported(_) => StatusCode::HttpVersionNotSupported,
            Error::HeaderFieldsTooLarge(_) => StatusCode::RequestHeaderFieldsTooLarge,
            Error::NotFound(_) => StatusCode::NotFound,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}
