//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::parser::{ParseLimits, DEFAULT_MAX_HEADERS, DEFAULT_MAX_REQUEST_SIZE};
use crate::server::error::Error;

/// Fixed-window rate limiter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether requests are counted at all.
    pub enabled: bool,
    /// Ban length in seconds once the limit is exceeded.
    pub timeout_secs: u64,
    /// Requests allowed per window.
    pub max_requests: u64,
    /// Window length in seconds.
    pub time_frame_secs: u64,
}

impl RateLimitConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
    pub const DEFAULT_MAX_REQUESTS: u64 = 10;
    pub const DEFAULT_TIME_FRAME_SECS: u64 = 10;

    /// An enabled limiter.
    pub fn enabled(timeout_secs: u64, max_requests: u64, time_frame_secs: u64) -> Self {
        Self {
            enabled: true,
            timeout_secs,
            max_requests,
            time_frame_secs,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            max_requests: Self::DEFAULT_MAX_REQUESTS,
            time_frame_secs: Self::DEFAULT_TIME_FRAME_SECS,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// Whether API versions and versioned routes may be registered.
    pub versioning: bool,
    /// Whether 200 responses are cached.
    pub response_caching: bool,
    /// How long a cached response stays valid, in seconds.
    pub cache_ttl_secs: u64,
    /// Rate limiter settings.
    pub rate_limit: RateLimitConfig,
    /// Bytes read from a client per readiness event.
    pub read_chunk_size: usize,
    /// Largest request buffered or declared before the connection is dropped.
    pub max_request_size: usize,
    /// Largest number of header fields accepted.
    pub max_headers: usize,
    /// Upper bound on one wait for socket readiness, in milliseconds.
    pub poll_interval_ms: u64,
    /// Cache sweep cadence, in seconds.
    pub maintenance_interval_secs: u64,
    /// Wall-clock budget for writing one response, in seconds.
    pub write_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            versioning: false,
            response_caching: false,
            cache_ttl_secs: 60,
            rate_limit: RateLimitConfig::default(),
            read_chunk_size: 8192,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            max_headers: DEFAULT_MAX_HEADERS,
            poll_interval_ms: 50,
            maintenance_interval_secs: 5,
            write_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Load a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_versioning(mut self, enabled: bool) -> Self {
        self.versioning = enabled;
        self
    }

    /// Enable or disable response caching with the given TTL.
    pub fn with_response_caching(mut self, enabled: bool, ttl_secs: u64) -> Self {
        self.response_caching = enabled;
        self.cache_ttl_secs = ttl_secs;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_max_request_size(mut self, max_request_size: usize) -> Self {
        self.max_request_size = max_request_size;
        self
    }

    /// Parser limits derived from this configuration.
    pub fn limits(&self) -> ParseLimits {
        ParseLimits {
            max_request_size: self.max_request_size,
            max_headers: self.max_headers,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}
