//! Per-address fixed-window rate limiting with sticky bans.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::info;

use crate::address::Address;
use crate::server::clock::unix_timestamp;
use crate::server::config::RateLimitConfig;

/// Outcome of [`RateLimiter::check_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    /// Denied until the given Unix timestamp.
    Banned { until: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    ends_at: u64,
}

#[derive(Debug, Default)]
struct LimiterState {
    bans: HashMap<String, u64>,
    windows: HashMap<String, Window>,
}

impl LimiterState {
    /// Active ban expiry for `host`, dropping a lapsed ban.
    fn active_ban(&mut self, host: &str, now: u64) -> Option<u64> {
        match self.bans.get(host) {
            Some(&until) if now < until => Some(until),
            Some(_) => {
                self.bans.remove(host);
                None
            }
            None => None,
        }
    }
}

/// Counts requests per client host in fixed windows and bans hosts that
/// exceed the limit.
///
/// All state sits behind one mutex so each check is atomic as a whole; share
/// the limiter between servers through an `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// A limiter that allows everything.
    pub fn disabled() -> Self {
        Self::new(RateLimitConfig::default())
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Count a request from `address` and decide whether it may proceed.
    pub fn check_request(&self, address: &Address) -> RateLimitDecision {
        self.check_request_at(address, unix_timestamp())
    }

    /// [`check_request`](Self::check_request) at an explicit time.
    pub fn check_request_at(&self, address: &Address, now: u64) -> RateLimitDecision {
        if !self.config.enabled {
            return RateLimitDecision::Allowed;
        }

        let mut state = self.lock();
        let host = address.host();

        if let Some(until) = state.active_ban(host, now) {
            return RateLimitDecision::Banned { until };
        }

        let window = state
            .windows
            .entry(host.to_string())
            .or_insert(Window { count: 0, ends_at: 0 });
        if window.ends_at <= now {
            *window = Window {
                count: 0,
                ends_at: now.saturating_add(self.config.time_frame_secs),
            };
        }

        window.count += 1;
        if window.count > self.config.max_requests {
            let until = now.saturating_add(self.config.timeout_secs);
            state.bans.insert(host.to_string(), until);
            info!("Rate limited {address} for {}s", self.config.timeout_secs);
            return RateLimitDecision::Banned { until };
        }

        RateLimitDecision::Allowed
    }

    /// Ban `address` for `timeout_secs`, or the configured timeout.
    ///
    /// Returns the ban expiry, or `None` when the limiter is disabled.
    pub fn ban(&self, address: &Address, timeout_secs: Option<u64>) -> Option<u64> {
        self.ban_at(address, timeout_secs, unix_timestamp())
    }

    /// [`ban`](Self::ban) at an explicit time.
    pub fn ban_at(&self, address: &Address, timeout_secs: Option<u64>, now: u64) -> Option<u64> {
        if !self.config.enabled {
            return None;
        }

        let timeout = timeout_secs.unwrap_or(self.config.timeout_secs);
        let until = now.saturating_add(timeout);
        self.lock().bans.insert(address.host().to_string(), until);
        info!("Rate limited {address} for {timeout}s");
        Some(until)
    }

    /// Whether `address` is currently banned.
    pub fn is_banned(&self, address: &Address) -> bool {
        self.is_banned_at(address, unix_timestamp())
    }

    /// [`is_banned`](Self::is_banned) at an explicit time.
    pub fn is_banned_at(&self, address: &Address, now: u64) -> bool {
        self.lock().active_ban(address.host(), now).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
