//! Route and API version registry.
//!
//! Routes are either plain (`/<path>`) or versioned (`/<version>/<path>`).
//! Each carries an [`Authentication`] policy and a [`RouteHandler`]; API
//! versions add a second authentication layer shared by all their routes.

mod auth;
mod error;
mod handler;
mod registry;
mod route;
mod tests;
mod version;

// Re-export public items
pub use auth::{Authentication, NoAuth};
pub use error::RegistryError;
pub use handler::RouteHandler;
pub use registry::Registry;
pub use route::{Route, RouteKind};
pub use version::ApiVersion;
