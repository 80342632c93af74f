//! HTTP parser module.
//!
//! Two pure stages: framing decides when the bytes of a connection form a
//! complete request, and parsing turns that buffer into a [`Request`]
//! resolved against the route registry, or into the failure status to answer
//! with.

mod error;
mod framing;
mod method;
mod query;
mod request;
mod tests;
mod version;

// Re-export public items
pub use error::Error;
pub use framing::{FrameBuffer, FramePhase, HEADER_TERMINATOR};
pub use method::Method;
pub use query::{parse_query, sorted_query_string};
pub use request::{parse_request, ParseLimits, Request, DEFAULT_MAX_HEADERS, DEFAULT_MAX_REQUEST_SIZE};
pub use version::HttpVersion;
