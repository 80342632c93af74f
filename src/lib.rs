//! A polling HTTP/1.x server engine.
//!
//! This library owns the whole connection lifecycle on top of raw TCP
//! sockets: one task multiplexes the listener and every client, buffers each
//! connection until its request is framed, parses and resolves it against a
//! registry of plain and versioned routes, applies authentication, rate
//! limiting and a TTL response cache, and answers exactly once before
//! closing.
//!
//! # Features
//!
//! - Framing under partial reads with a hard request size cap
//! - Strict request-line, path and header validation
//! - Plain (`/<path>`) and versioned (`/<version>/<path>`) routes
//! - Per-version and per-route authentication hooks
//! - Per-client fixed-window rate limiting with sticky bans
//! - Caching of `200` responses keyed by version, method, path and query
//!
//! # Examples
//!
//! ## Registering routes
//!
//! ```
//! use pollhttp_rs::{ApiVersion, HttpServer, Method, Request, ResponseBuilder, Route, ServerConfig};
//!
//! let config = ServerConfig::default()
//!     .with_versioning(true)
//!     .with_response_caching(true, 60);
//! let mut server = HttpServer::new(config);
//!
//! server.register_version(ApiVersion::new("v1")).unwrap();
//! server
//!     .register_route(Route::versioned("v1", Method::GET, "widgets", |_req: &Request| {
//!         ResponseBuilder::new().body("[]").build()
//!     }))
//!     .unwrap();
//!
//! let version = server.registry().resolve_version("v1", Method::GET).unwrap();
//! assert!(version.is_valid_path(Method::GET, "/widgets"));
//! assert!(!version.is_valid_path(Method::POST, "/widgets"));
//! ```
//!
//! ## Running the pipeline without sockets
//!
//! ```
//! use pollhttp_rs::{Address, HttpServer, Method, Request, ResponseBuilder, Route, ServerConfig, StatusCode};
//!
//! let mut server = HttpServer::new(ServerConfig::default());
//! server
//!     .register_route(Route::plain(Method::GET, "/health", |_req: &Request| {
//!         ResponseBuilder::new().body("{\"status\":\"ok\"}").build()
//!     }))
//!     .unwrap();
//!
//! let client = Address::new("127.0.0.1", 50000);
//! let response = server.process_request(&client, b"GET /health HTTP/1.1\r\nHost: x\r\n\r\n");
//! assert_eq!(response.status(), StatusCode::Ok);
//!
//! let response = server.process_request(&client, b"GET /missing HTTP/1.1\r\n\r\n");
//! assert_eq!(response.status(), StatusCode::NotFound);
//! ```
//!
//! See the `demos` directory for a complete server.

mod address;

// Export the parser module
pub mod parser;

// Export the routing module
pub mod routing;

// Export the server module
pub mod server;

// Re-export commonly used items for convenience
pub use address::Address;
pub use parser::{parse_request, Error as ParserError, FrameBuffer, FramePhase, HttpVersion, Method, Request};
pub use routing::{ApiVersion, Authentication, NoAuth, Registry, RegistryError, Route, RouteHandler, RouteKind};
pub use server::{
    Error as ServerError, HttpResponse, HttpServer, RateLimitConfig, RateLimiter, ResponseBuilder,
    ResponseCache, ServerConfig, StatusCode,
};
