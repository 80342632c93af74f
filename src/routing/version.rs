//! API versions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::parser::Method;
use crate::routing::auth::{Authentication, NoAuth};
use crate::routing::route::normalize_path;

/// A named group of routes sharing an authentication policy.
///
/// The valid-path set is filled in as versioned routes are registered.
pub struct ApiVersion {
    id: String,
    authentication: Arc<dyn Authentication>,
    paths: HashMap<Method, Vec<String>>,
}

impl ApiVersion {
    /// A version that admits every client.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            authentication: Arc::new(NoAuth),
            paths: HashMap::new(),
        }
    }

    /// Replace the version-level authentication.
    pub fn with_authentication(mut self, authentication: impl Authentication + 'static) -> Self {
        self.authentication = Arc::new(authentication);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn authentication(&self) -> &dyn Authentication {
        self.authentication.as_ref()
    }

    /// Add a version-relative path for `method`, ignoring duplicates.
    pub fn add_path(&mut self, method: Method, path: &str) {
        let path = normalize_path(path);
        let paths = self.paths.entry(method).or_default();
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    /// Whether `path` is served by this version for `method`.
    ///
    /// The version-relative form (`/widgets`) is matched as is; the full form
    /// (`/v1/widgets`) is tried only when that misses.
    pub fn is_valid_path(&self, method: Method, path: &str) -> bool {
        let Some(paths) = self.paths.get(&method) else {
            return false;
        };
        let contains = |candidate: &str| paths.iter().any(|p| p == candidate);

        if contains(&normalize_path(path)) {
            return true;
        }
        self.strip_id(path).is_some_and(|relative| contains(&relative))
    }

    /// Registered version-relative paths per method.
    pub fn paths(&self) -> &HashMap<Method, Vec<String>> {
        &self.paths
    }

    /// `/<id>/rest` as `/rest`, and `/<id>` as `/`.
    fn strip_id(&self, path: &str) -> Option<String> {
        let trimmed = path.trim_matches('/');
        if trimmed == self.id {
            return Some("/".to_string());
        }
        trimmed
            .strip_prefix(self.id.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .map(normalize_path)
    }
}

impl fmt::Debug for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiVersion")
            .field("id", &self.id)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}
