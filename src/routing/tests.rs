//! Tests for route and version registration.

#[cfg(test)]
mod tests {
    use crate::address::Address;
    use crate::parser::{Method, Request};
    use crate::routing::{ApiVersion, Registry, RegistryError, Route, RouteKind};
    use crate::server::{HttpResponse, ResponseBuilder, StatusCode};

    fn ok(_req: &Request) -> HttpResponse {
        ResponseBuilder::new().build()
    }

    fn created(_req: &Request) -> HttpResponse {
        ResponseBuilder::new().code(StatusCode::Created).build()
    }

    #[test]
    fn test_full_paths() {
        assert_eq!(Route::plain(Method::GET, "status/", ok).full_path(), "/status");
        assert_eq!(Route::plain(Method::GET, "", ok).full_path(), "/");
        assert_eq!(Route::versioned("v1", Method::GET, "/users/", ok).full_path(), "/v1/users");
        assert_eq!(Route::versioned("v1", Method::GET, "/", ok).full_path(), "/v1");

        let route = Route::versioned("v2", Method::POST, "items/new", ok);
        assert_eq!(route.relative_path(), "/items/new");
        assert_eq!(route.path(), "items/new");
        assert_eq!(route.kind(), &RouteKind::Versioned("v2".to_string()));
        assert_eq!(route.api_version(), Some("v2"));
    }

    #[test]
    fn test_versioned_route_requires_versioning() {
        let mut registry = Registry::new(false);
        let err = registry
            .register_route(Route::versioned("v1", Method::GET, "/users", ok))
            .unwrap_err();
        assert_eq!(err, RegistryError::VersioningDisabled);

        assert_eq!(
            registry.register_version(ApiVersion::new("v1")).unwrap_err(),
            RegistryError::VersioningDisabled
        );

        // Plain routes are fine either way.
        assert!(registry.register_route(Route::plain(Method::GET, "/users", ok)).is_ok());
    }

    #[test]
    fn test_duplicate_version() {
        let mut registry = Registry::new(true);
        registry.register_version(ApiVersion::new("v1")).unwrap();
        assert_eq!(
            registry.register_version(ApiVersion::new("v1")).unwrap_err(),
            RegistryError::VersionAlreadyExists("v1".to_string())
        );
        assert_eq!(registry.versions().count(), 1);
    }

    #[test]
    fn test_unsupported_method() {
        let mut registry = Registry::new(false);
        for method in [Method::HEAD, Method::OPTIONS] {
            assert_eq!(
                registry.register_route(Route::plain(method, "/users", ok)).unwrap_err(),
                RegistryError::UnsupportedMethod(method)
            );
        }
        assert_eq!(registry.routes().count(), 0);
    }

    #[test]
    fn test_unknown_version() {
        let mut registry = Registry::new(true);
        registry.register_version(ApiVersion::new("v1")).unwrap();
        let err = registry
            .register_route(Route::versioned("v3", Method::GET, "/users", ok))
            .unwrap_err();
        assert_eq!(err, RegistryError::UnknownApiVersion("v3".to_string()));
    }

    #[test]
    fn test_valid_paths_are_tracked_per_method() {
        let mut registry = Registry::new(true);
        registry.register_version(ApiVersion::new("v1")).unwrap();
        registry
            .register_route(Route::versioned("v1", Method::GET, "users", ok))
            .unwrap();
        registry
            .register_route(Route::versioned("v1", Method::GET, "/users/", ok))
            .unwrap();

        let version = registry.version("v1").unwrap();
        assert_eq!(version.paths()[&Method::GET], vec!["/users".to_string()]);
        assert!(version.is_valid_path(Method::GET, "/users"));
        assert!(version.is_valid_path(Method::GET, "users/"));
        assert!(version.is_valid_path(Method::GET, "/v1/users"));
        assert!(!version.is_valid_path(Method::POST, "/users"));
        assert!(!version.is_valid_path(Method::GET, "/orders"));
    }

    #[test]
    fn test_relative_paths_starting_with_version_id() {
        let mut registry = Registry::new(true);
        registry.register_version(ApiVersion::new("v1")).unwrap();
        registry.register_version(ApiVersion::new("api")).unwrap();
        registry
            .register_route(Route::versioned("v1", Method::GET, "v1/items", ok))
            .unwrap();
        registry
            .register_route(Route::versioned("api", Method::GET, "api", ok))
            .unwrap();

        let v1 = registry.version("v1").unwrap();
        assert_eq!(v1.paths()[&Method::GET], vec!["/v1/items".to_string()]);
        assert!(v1.is_valid_path(Method::GET, "/v1/items"));
        assert!(v1.is_valid_path(Method::GET, "/v1/v1/items"));
        assert!(!v1.is_valid_path(Method::GET, "/items"));

        let api = registry.version("api").unwrap();
        assert!(api.is_valid_path(Method::GET, "/api"));
        assert!(api.is_valid_path(Method::GET, "/api/api"));
        assert!(!api.is_valid_path(Method::POST, "/api"));

        assert_eq!(registry.resolve_version("/v1/items", Method::GET).unwrap().id(), "v1");
        assert_eq!(registry.resolve_version("/api/api", Method::GET).unwrap().id(), "api");
        assert_eq!(registry.resolve_version("api", Method::GET).unwrap().id(), "api");

        // Served at the full paths
        assert!(registry.resolve_route(Method::GET, "/v1/v1/items").is_some());
        assert!(registry.resolve_route(Method::GET, "/api/api").is_some());
    }

    #[test]
    fn test_resolve_version_by_id_then_by_path() {
        let mut registry = Registry::new(true);
        registry.register_version(ApiVersion::new("v1")).unwrap();
        registry.register_version(ApiVersion::new("v2")).unwrap();
        registry
            .register_route(Route::versioned("v2", Method::GET, "/reports", ok))
            .unwrap();

        assert_eq!(registry.resolve_version("v1", Method::GET).unwrap().id(), "v1");
        assert_eq!(registry.resolve_version("/reports", Method::GET).unwrap().id(), "v2");
        assert_eq!(registry.resolve_version("/v2/reports", Method::GET).unwrap().id(), "v2");
        assert!(registry.resolve_version("/reports", Method::DELETE).is_none());
        assert!(registry.resolve_version("v9", Method::GET).is_none());
    }

    #[test]
    fn test_resolve_version_prefers_earliest_registration() {
        let mut registry = Registry::new(true);
        registry.register_version(ApiVersion::new("v1")).unwrap();
        registry.register_version(ApiVersion::new("v2")).unwrap();
        registry
            .register_route(Route::versioned("v2", Method::GET, "/shared", ok))
            .unwrap();
        registry
            .register_route(Route::versioned("v1", Method::GET, "/shared", ok))
            .unwrap();

        assert_eq!(registry.resolve_version("/shared", Method::GET).unwrap().id(), "v1");
    }

    #[test]
    fn test_resolve_route_is_exact() {
        let mut registry = Registry::new(true);
        registry.register_version(ApiVersion::new("v1")).unwrap();
        registry.register_route(Route::plain(Method::GET, "/users", ok)).unwrap();
        registry
            .register_route(Route::versioned("v1", Method::GET, "/users", ok))
            .unwrap();

        let plain = registry.resolve_route(Method::GET, "/users").unwrap();
        assert_eq!(plain.api_version(), None);
        let versioned = registry.resolve_route(Method::GET, "/v1/users").unwrap();
        assert_eq!(versioned.api_version(), Some("v1"));

        assert!(registry.resolve_route(Method::POST, "/users").is_none());
        assert!(registry.resolve_route(Method::GET, "/users/").is_none());
    }

    #[test]
    fn test_reregistration_replaces_route() {
        let mut registry = Registry::new(false);
        registry.register_route(Route::plain(Method::POST, "/users", ok)).unwrap();
        registry.register_route(Route::plain(Method::POST, "/users", created)).unwrap();
        assert_eq!(registry.routes().count(), 1);

        // The replacement handler is the one the registry hands out.
        let route = registry.resolve_route(Method::POST, "/users").unwrap();
        let mut reference = Registry::new(false);
        reference.register_route(Route::plain(Method::POST, "/probe", ok)).unwrap();
        let request = crate::parser::parse_request(
            &Address::new("127.0.0.1", 1),
            b"POST /probe HTTP/1.1\r\n\r\n",
            &reference,
            &Default::default(),
        )
        .unwrap();
        assert_eq!(route.handler().handle(&request).status(), StatusCode::Created);
    }

    #[test]
    fn test_closure_authentication() {
        let mut registry = Registry::new(true);
        registry
            .register_version(
                ApiVersion::new("v1")
                    .with_authentication(|client: &Address, _req: &Request| client.host() == "10.0.0.1"),
            )
            .unwrap();
        registry
            .register_route(Route::versioned("v1", Method::GET, "/users", ok))
            .unwrap();

        let request = crate::parser::parse_request(
            &Address::new("10.0.0.1", 5000),
            b"GET /v1/users HTTP/1.1\r\n\r\n",
            &registry,
            &Default::default(),
        )
        .unwrap();

        let version = registry.version("v1").unwrap();
        assert!(version.authentication().authenticate(&Address::new("10.0.0.1", 5000), &request));
        assert!(!version.authentication().authenticate(&Address::new("10.0.0.2", 5000), &request));
        assert!(request.route.authentication().authenticate(&request.address, &request));
    }
}
