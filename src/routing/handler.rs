//! Route handlers.

use crate::parser::Request;
use crate::server::{HttpResponse, ResponseBuilder, StatusCode};

/// The behaviour attached to a registered route.
///
/// Only [`handle`](RouteHandler::handle) is required. The pre-checks run
/// before the response cache is consulted and receive a builder already set
/// to 400 or 500 which they may customise; returning `true` sends it.
pub trait RouteHandler: Send + Sync {
    /// Produce the response for a request that passed every check.
    ///
    /// With response caching enabled this runs while the cache lock is held,
    /// so it must not use the server's [`ResponseCache`](crate::ResponseCache).
    fn handle(&self, request: &Request) -> HttpResponse;

    /// Response sent when version-level or route-level authentication fails.
    fn handle_failed_auth(&self, _request: &Request) -> HttpResponse {
        ResponseBuilder::new().code(StatusCode::Forbidden).build()
    }

    /// Signal a client error before the handler runs.
    fn is_bad_request(&self, _request: &Request, _response: &mut ResponseBuilder) -> bool {
        false
    }

    /// Signal a server-side error before the handler runs.
    fn will_cause_error(&self, _request: &Request, _response: &mut ResponseBuilder) -> bool {
        false
    }
}

impl<F> RouteHandler for F
where
    F: Fn(&Request) -> HttpResponse + Send + Sync,
{
    fn handle(&self, request: &Request) -> HttpResponse {
        self(request)
    }
}
