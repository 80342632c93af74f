//! HTTP server implementation.
//!
//! One task drives a polling loop over the listening socket and every open
//! client. Each connection buffers bytes until its request is framed, gets
//! exactly one response and is closed.

use std::collections::HashMap;
use std::future::{poll_fn, Future};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use log::{debug, error, info, trace, warn};
use serde_json::json;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::time;

use crate::address::Address;
use crate::parser::{parse_request, FramePhase, Request};
use crate::routing::{ApiVersion, Registry, Route};
use crate::server::cache::ResponseCache;
use crate::server::clock::unix_timestamp;
use crate::server::config::ServerConfig;
use crate::server::connection::{Connection, ReadOutcome};
use crate::server::error::Error;
use crate::server::rate_limit::{RateLimitDecision, RateLimiter};
use crate::server::response::{HttpResponse, ResponseBuilder, StatusCode};

/// How often connection and request totals are logged.
const STATS_INTERVAL: Duration = Duration::from_secs(30);

/// Builds the response for a rate-limited client from the ban expiry.
pub type RateLimitResponder = Arc<dyn Fn(&Address, &Request, u64) -> HttpResponse + Send + Sync>;

/// An HTTP server.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    registry: Registry,
    rate_limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
    rate_limit_response: RateLimitResponder,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit));
        let cache = Arc::new(ResponseCache::new(config.response_caching, config.cache_ttl_secs));
        Self::with_shared_state(config, rate_limiter, cache)
    }

    /// Create a server that shares its rate limiter and response cache with
    /// other servers.
    ///
    /// The rate-limit and caching settings of `config` are ignored in favour
    /// of the ones the shared instances were built with.
    pub fn with_shared_state(
        config: ServerConfig,
        rate_limiter: Arc<RateLimiter>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            registry: Registry::new(config.versioning),
            config,
            rate_limiter,
            cache,
            rate_limit_response: Arc::new(default_rate_limit_response),
        }
    }

    /// Register a route. Only possible before serving starts.
    pub fn register_route(&mut self, route: Route) -> Result<Arc<Route>, Error> {
        Ok(self.registry.register_route(route)?)
    }

    /// Register an API version. Only possible before serving starts.
    pub fn register_version(&mut self, version: ApiVersion) -> Result<(), Error> {
        Ok(self.registry.register_version(version)?)
    }

    /// Replace the response sent to rate-limited clients.
    pub fn set_rate_limit_response<F>(&mut self, responder: F)
    where
        F: Fn(&Address, &Request, u64) -> HttpResponse + Send + Sync + 'static,
    {
        self.rate_limit_response = Arc::new(responder);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Display the registered versions and endpoints.
    fn display_server_info(&self) {
        for version in self.registry.versions() {
            info!("API version: {}", version.id());
        }

        let mut endpoints: Vec<(String, String)> = self
            .registry
            .routes()
            .map(|route| (route.full_path(), route.method().to_string()))
            .collect();
        endpoints.sort();

        info!("Registered endpoints:");
        for (path, method) in endpoints {
            info!("  {method} {path}");
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let addr = self.config.addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        info!("Server listening on http://{addr}");
        Ok(listener)
    }

    /// Resolve when Ctrl+C is received.
    async fn ctrl_c() {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
            Err(e) => {
                error!("Error setting up Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    }

    /// Bind the configured address and serve until Ctrl+C.
    pub async fn start(&self) -> Result<(), Error> {
        self.display_server_info();
        let listener = self.setup_listener().await?;
        self.serve(listener, Self::ctrl_c()).await
    }

    /// Serve connections from `listener` until `shutdown` resolves.
    ///
    /// Open client connections are dropped on shutdown.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let mut reactor = Reactor::new(self, listener);
        tokio::pin!(shutdown);

        debug!("Server event loop started");

        loop {
            let polled = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down server...");
                    break;
                }
                polled = time::timeout(self.config.poll_interval(), reactor.next_events()) => polled,
            };

            // A timeout means an idle iteration: only maintenance runs.
            if let Ok(events) = polled {
                for event in events {
                    reactor.dispatch(event).await;
                }
            }

            reactor.maintenance();
        }

        reactor.close_all();
        info!("Server shutdown complete");
        Ok(())
    }

    /// Run the request pipeline over a complete request buffer.
    ///
    /// Order: parse, version authentication, route authentication, rate
    /// limit, bad-request pre-check, server-error pre-check, then the cache
    /// or the handler.
    pub fn process_request(&self, address: &Address, buffer: &[u8]) -> HttpResponse {
        let request = match parse_request(address, buffer, &self.registry, &self.config.limits()) {
            Ok(request) => request,
            Err(e) => {
                debug!("Rejected request from {address}: {e}");
                return HttpResponse::new(e.status());
            }
        };

        let route = Arc::clone(&request.route);
        let handler = route.handler();

        if let Some(id) = route.api_version() {
            if let Some(version) = self.registry.resolve_version(id, route.method()) {
                if !version.authentication().authenticate(address, &request) {
                    debug!("API version {id} refused {address}");
                    return handler.handle_failed_auth(&request);
                }
            }
        }

        if !route.authentication().authenticate(address, &request) {
            debug!("Route {} refused {address}", route.full_path());
            return handler.handle_failed_auth(&request);
        }

        if let RateLimitDecision::Banned { until } = self.rate_limiter.check_request(address) {
            return (self.rate_limit_response)(address, &request, until);
        }

        let mut bad_request = ResponseBuilder::new();
        bad_request.code(StatusCode::BadRequest);
        if handler.is_bad_request(&request, &mut bad_request) {
            return bad_request.build();
        }

        let mut server_error = ResponseBuilder::new();
        server_error.code(StatusCode::InternalServerError);
        if handler.will_cause_error(&request, &mut server_error) {
            return server_error.build();
        }

        let (response, outcome) = self.cache.fetch_or_store(&request, || handler.handle(&request));
        trace!("{} {} served ({outcome:?})", request.method, request.path);
        response
    }

    /// Write `response` and close the write side, within `timeout`.
    pub async fn write_response<S>(
        socket: &mut S,
        response: &HttpResponse,
        timeout: Duration,
    ) -> Result<(), Error>
    where
        S: AsyncWrite + Unpin,
    {
        let bytes = response.to_bytes();
        let write = async {
            socket.write_all(&bytes).await?;
            socket.shutdown().await
        };

        match time::timeout(timeout, write).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(Error::WriteTimeout(timeout)),
        }
    }
}

/// 429 with the seconds left and the absolute unban time.
fn default_rate_limit_response(_client: &Address, _request: &Request, until: u64) -> HttpResponse {
    let remaining = until.saturating_sub(unix_timestamp());
    let body = json!({
        "message": format!("You are being rate limited. Please try again in {remaining} seconds."),
        "end_timestamp": until,
    });

    let mut builder = ResponseBuilder::new();
    builder.code(StatusCode::TooManyRequests);
    if let Err(e) = builder.json(&body) {
        warn!("Failed to encode rate limit body: {e}");
    }
    builder.build()
}

/// Readiness reported by one poll.
enum Event {
    Accepted(io::Result<(TcpStream, SocketAddr)>),
    Readable(usize),
}

/// Per-`serve` loop state. Connections never leave this struct.
struct Reactor<'a> {
    server: &'a HttpServer,
    listener: TcpListener,
    connections: HashMap<usize, Connection>,
    next_token: usize,
    last_sweep: Instant,
    last_stats: Instant,
    total_connections: u64,
    total_requests: u64,
}

impl<'a> Reactor<'a> {
    fn new(server: &'a HttpServer, listener: TcpListener) -> Self {
        let now = Instant::now();
        Self {
            server,
            listener,
            connections: HashMap::new(),
            next_token: 0,
            last_sweep: now,
            last_stats: now,
            total_connections: 0,
            total_requests: 0,
        }
    }

    /// Wait until the listener or at least one client is ready.
    fn next_events(&self) -> impl Future<Output = Vec<Event>> + '_ {
        poll_fn(move |cx| self.poll_events(cx))
    }

    fn poll_events(&self, cx: &mut Context<'_>) -> Poll<Vec<Event>> {
        let mut events = Vec::new();

        if let Poll::Ready(accepted) = self.listener.poll_accept(cx) {
            events.push(Event::Accepted(accepted));
        }

        for (token, conn) in &self.connections {
            if conn.stream.poll_read_ready(cx).is_ready() {
                events.push(Event::Readable(*token));
            }
        }

        if events.is_empty() {
            Poll::Pending
        } else {
            Poll::Ready(events)
        }
    }

    async fn dispatch(&mut self, event: Event) {
        match event {
            Event::Accepted(Ok((stream, peer))) => self.register(stream, peer),
            Event::Accepted(Err(e)) => warn!("Error accepting connection: {e}"),
            Event::Readable(token) => self.handle_readable(token).await,
        }
    }

    fn register(&mut self, stream: TcpStream, peer: SocketAddr) {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        self.total_connections += 1;

        let conn = Connection::new(stream, Address::from(peer), self.server.config.max_request_size);
        self.connections.insert(token, conn);
        debug!("Accepted connection from {peer} (token {token})");
    }

    async fn handle_readable(&mut self, token: usize) {
        let chunk_size = self.server.config.read_chunk_size;
        let Some(conn) = self.connections.get_mut(&token) else {
            warn!("Readable event for unknown token {token}");
            return;
        };

        match conn.read_chunk(chunk_size) {
            Ok(ReadOutcome::Progress(FramePhase::Complete)) => {
                if let Some(conn) = self.connections.remove(&token) {
                    self.complete(conn).await;
                }
            }
            Ok(ReadOutcome::Progress(phase)) => {
                trace!("Connection {token}: {phase:?}, {} bytes buffered", conn.frame.len());
            }
            Ok(ReadOutcome::Spurious) => {}
            Ok(ReadOutcome::PeerClosed) => {
                debug!("Connection {} closed by peer", conn.address);
                self.connections.remove(&token);
            }
            Ok(ReadOutcome::Overflow) => {
                warn!(
                    "Request from {} exceeds {} bytes, dropping connection",
                    conn.address, self.server.config.max_request_size
                );
                self.connections.remove(&token);
            }
            Err(e) => {
                debug!("Error reading from {}: {e}", conn.address);
                self.connections.remove(&token);
            }
        }
    }

    /// Answer a framed request; the connection is closed when `conn` drops.
    async fn complete(&mut self, mut conn: Connection) {
        self.total_requests += 1;
        self.server.cache.sweep();

        let response = self.server.process_request(&conn.address, conn.frame.as_bytes());
        debug!(
            "{} -> {} after {:?}",
            conn.address,
            response.status(),
            conn.accepted_at.elapsed()
        );

        let timeout = self.server.config.write_timeout();
        if let Err(e) = HttpServer::write_response(&mut conn.stream, &response, timeout).await {
            debug!("Failed to respond to {}: {e}", conn.address);
        }
    }

    fn maintenance(&mut self) {
        let now = Instant::now();

        if now.duration_since(self.last_sweep) >= self.server.config.maintenance_interval() {
            self.server.cache.sweep();
            self.last_sweep = now;
        }

        if now.duration_since(self.last_stats) >= STATS_INTERVAL {
            debug!(
                "{} connections accepted, {} requests processed, {} open",
                self.total_connections,
                self.total_requests,
                self.connections.len()
            );
            self.last_stats = now;
        }
    }

    fn close_all(&mut self) {
        if !self.connections.is_empty() {
            info!("Dropping {} open connections", self.connections.len());
        }
        self.connections.clear();
    }
}
