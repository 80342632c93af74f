//! HTTP server implementation for pollhttp-rs.
//!
//! This module provides the polling reactor, the request pipeline and the
//! shared rate limiter and response cache it consults.

mod cache;
mod clock;
mod config;
mod connection;
mod error;
mod http_server;
mod rate_limit;
mod response;

// Re-export public items
pub use cache::{CacheOutcome, ResponseCache};
pub use clock::unix_timestamp;
pub use config::{RateLimitConfig, ServerConfig};
pub use error::Error;
pub use http_server::{HttpServer, RateLimitResponder};
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use response::{HttpResponse, ResponseBuilder, StatusCode};
