//! The route and API version registry.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::parser::Method;
use crate::routing::error::RegistryError;
use crate::routing::route::{Route, RouteKind};
use crate::routing::version::ApiVersion;

/// Routes keyed by `(method, full path)` plus API versions in registration order.
///
/// Mutated only during setup; the server reads it through a shared borrow
/// while serving.
#[derive(Debug, Default)]
pub struct Registry {
    versioning: bool,
    routes: HashMap<(Method, String), Arc<Route>>,
    versions: Vec<ApiVersion>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new(versioning: bool) -> Self {
        Self {
            versioning,
            routes: HashMap::new(),
            versions: Vec::new(),
        }
    }

    pub fn is_versioning_enabled(&self) -> bool {
        self.versioning
    }

    /// Register a route under its full path.
    ///
    /// A versioned route also adds its version-relative path to the owning
    /// [`ApiVersion`]. Registering the same method and full path twice
    /// replaces the earlier route.
    pub fn register_route(&mut self, route: Route) -> Result<Arc<Route>, RegistryError> {
        if route.api_version().is_some() && !self.versioning {
            return Err(RegistryError::VersioningDisabled);
        }
        if !route.method().is_supported() {
            return Err(RegistryError::UnsupportedMethod(route.method()));
        }

        if let RouteKind::Versioned(id) = route.kind() {
            let version = self
                .versions
                .iter_mut()
                .find(|version| version.id() == id)
                .ok_or_else(|| RegistryError::UnknownApiVersion(id.clone()))?;
            version.add_path(route.method(), &route.relative_path());
        }

        let key = (route.method(), route.full_path());
        debug!("Registered route {} {}", key.0, key.1);
        let route = Arc::new(route);
        self.routes.insert(key, Arc::clone(&route));
        Ok(route)
    }

    /// Register an API version.
    pub fn register_version(&mut self, version: ApiVersion) -> Result<(), RegistryError> {
        if !self.versioning {
            return Err(RegistryError::VersioningDisabled);
        }
        if self.version(version.id()).is_some() {
            return Err(RegistryError::VersionAlreadyExists(version.id().to_string()));
        }

        debug!("Registered API version {}", version.id());
        self.versions.push(version);
        Ok(())
    }

    /// Look up an API version by id only.
    pub fn version(&self, id: &str) -> Option<&ApiVersion> {
        self.versions.iter().find(|version| version.id() == id)
    }

    /// Resolve a version by id, falling back to the first registered version
    /// that serves `token` as a path for `method`.
    ///
    /// When several versions serve the same relative path the earliest
    /// registration wins.
    pub fn resolve_version(&self, token: &str, method: Method) -> Option<&ApiVersion> {
        self.version(token).or_else(|| {
            self.versions
                .iter()
                .find(|version| version.is_valid_path(method, token))
        })
    }

    /// Exact lookup by method and full path.
    pub fn resolve_route(&self, method: Method, full_path: &str) -> Option<Arc<Route>> {
        self.routes.get(&(method, full_path.to_string())).cloned()
    }

    /// Registered routes in no particular order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.values()
    }

    /// Registered API versions in registration order.
    pub fn versions(&self) -> impl Iterator<Item = &ApiVersion> {
        self.versions.iter()
    }
}
