//! Registered routes.

use std::fmt;
use std::sync::Arc;

use crate::parser::Method;
use crate::routing::auth::{Authentication, NoAuth};
use crate::routing::handler::RouteHandler;

/// Whether a route lives under an API version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKind {
    /// Served at `/<path>`.
    Plain,
    /// Served at `/<version>/<path>`.
    Versioned(String),
}

/// A `(method, path[, version])` triple with its authentication and handler.
pub struct Route {
    path: String,
    method: Method,
    kind: RouteKind,
    authentication: Arc<dyn Authentication>,
    handler: Arc<dyn RouteHandler>,
}

impl Route {
    /// A route outside any API version, open to every client.
    pub fn plain(method: Method, path: impl Into<String>, handler: impl RouteHandler + 'static) -> Self {
        Self {
            path: path.into(),
            method,
            kind: RouteKind::Plain,
            authentication: Arc::new(NoAuth),
            handler: Arc::new(handler),
        }
    }

    /// A route under `version`, open to every client the version admits.
    pub fn versioned(
        version: impl Into<String>,
        method: Method,
        path: impl Into<String>,
        handler: impl RouteHandler + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            method,
            kind: RouteKind::Versioned(version.into()),
            authentication: Arc::new(NoAuth),
            handler: Arc::new(handler),
        }
    }

    /// Replace the route-level authentication.
    pub fn with_authentication(mut self, authentication: impl Authentication + 'static) -> Self {
        self.authentication = Arc::new(authentication);
        self
    }

    /// The path as registered, relative to the version for versioned routes.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path relative to the version, normalized to one leading slash.
    pub fn relative_path(&self) -> String {
        normalize_path(&self.path)
    }

    /// The path the route is served at.
    pub fn full_path(&self) -> String {
        match &self.kind {
            RouteKind::Plain => normalize_path(&self.path),
            RouteKind::Versioned(version) => match self.path.trim_matches('/') {
                "" => format!("/{version}"),
                rest => format!("/{version}/{rest}"),
            },
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn kind(&self) -> &RouteKind {
        &self.kind
    }

    /// The owning API version, `None` for plain routes.
    pub fn api_version(&self) -> Option<&str> {
        match &self.kind {
            RouteKind::Plain => None,
            RouteKind::Versioned(version) => Some(version),
        }
    }

    pub fn authentication(&self) -> &dyn Authentication {
        self.authentication.as_ref()
    }

    pub fn handler(&self) -> &dyn RouteHandler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.full_path())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Trim surrounding slashes and prefix exactly one.
pub(crate) fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}
