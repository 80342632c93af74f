//! Pluggable request authentication.

use crate::address::Address;
use crate::parser::Request;

/// Decides whether a client may use a route or API version.
pub trait Authentication: Send + Sync {
    /// Return `true` to let the request through.
    fn authenticate(&self, client: &Address, request: &Request) -> bool;
}

/// Lets every request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl Authentication for NoAuth {
    fn authenticate(&self, _client: &Address, _request: &Request) -> bool {
        true
    }
}

impl<F> Authentication for F
where
    F: Fn(&Address, &Request) -> bool + Send + Sync,
{
    fn authenticate(&self, client: &Address, request: &Request) -> bool {
        self(client, request)
    }
}
