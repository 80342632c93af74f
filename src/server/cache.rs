//! Time-bounded cache of successful responses.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::trace;

use crate::parser::Request;
use crate::server::clock::unix_timestamp;
use crate::server::response::{HttpResponse, StatusCode};

#[derive(Debug, Clone)]
struct CacheEntry {
    response: HttpResponse,
    inserted_at: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: u64, ttl: u64) -> bool {
        now >= self.inserted_at.saturating_add(ttl)
    }
}

/// Where a response handed out by [`ResponseCache::fetch_or_store`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    Bypassed,
}

/// Caches `200` responses per version, method, path and sorted query.
///
/// Every operation, including check-handle-store in
/// [`fetch_or_store`](Self::fetch_or_store), runs under one mutex.
#[derive(Debug)]
pub struct ResponseCache {
    enabled: bool,
    ttl_secs: u64,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(enabled: bool, ttl_secs: u64) -> Self {
        Self {
            enabled,
            ttl_secs,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `<version or "no-version">:<method>:<full path>[?<sorted query>]`
    pub fn key(request: &Request) -> String {
        let version = request.route.api_version().unwrap_or("no-version");
        let mut key = format!("{version}:{}:{}", request.route.method(), request.route.full_path());
        if !request.query_params.is_empty() {
            key.push('?');
            key.push_str(&request.sorted_query());
        }
        key
    }

    /// Return the cached response for `request`, evicting it if stale.
    pub fn check(&self, request: &Request) -> Option<HttpResponse> {
        self.check_at(request, unix_timestamp())
    }

    /// [`check`](Self::check) at an explicit time.
    pub fn check_at(&self, request: &Request, now: u64) -> Option<HttpResponse> {
        if !self.enabled {
            return None;
        }
        let mut entries = self.lock();
        self.lookup(&mut entries, &Self::key(request), now)
    }

    /// Store a `200` response for `request`; anything else is ignored.
    pub fn store(&self, request: &Request, response: &HttpResponse) {
        self.store_at(request, response, unix_timestamp());
    }

    /// [`store`](Self::store) at an explicit time.
    pub fn store_at(&self, request: &Request, response: &HttpResponse, now: u64) {
        if !self.enabled || response.status() != StatusCode::Ok {
            return;
        }
        let mut entries = self.lock();
        Self::insert(&mut entries, Self::key(request), response, now);
    }

    /// Serve from the cache or run `handle` and cache its result, all under
    /// one lock.
    ///
    /// The lock is held while `handle` runs: handlers on every server sharing
    /// this cache are serialised, and `handle` must not call back into this
    /// cache or it deadlocks.
    pub fn fetch_or_store<F>(&self, request: &Request, handle: F) -> (HttpResponse, CacheOutcome)
    where
        F: FnOnce() -> HttpResponse,
    {
        self.fetch_or_store_at(request, unix_timestamp(), handle)
    }

    /// [`fetch_or_store`](Self::fetch_or_store) at an explicit time.
    pub fn fetch_or_store_at<F>(&self, request: &Request, now: u64, handle: F) -> (HttpResponse, CacheOutcome)
    where
        F: FnOnce() -> HttpResponse,
    {
        if !self.enabled {
            return (handle(), CacheOutcome::Bypassed);
        }

        let key = Self::key(request);
        let mut entries = self.lock();
        if let Some(response) = self.lookup(&mut entries, &key, now) {
            trace!("Cache hit for {key}");
            return (response, CacheOutcome::Hit);
        }

        let response = handle();
        if response.status() == StatusCode::Ok {
            Self::insert(&mut entries, key, &response, now);
        }
        (response, CacheOutcome::Miss)
    }

    /// Drop every expired entry.
    pub fn sweep(&self) {
        self.sweep_at(unix_timestamp());
    }

    /// [`sweep`](Self::sweep) at an explicit time.
    pub fn sweep_at(&self, now: u64) {
        if !self.enabled {
            return;
        }
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, self.ttl_secs));
        let removed = before - entries.len();
        if removed > 0 {
            trace!("Swept {removed} expired cache entries");
        }
    }

    fn lookup(&self, entries: &mut HashMap<String, CacheEntry>, key: &str, now: u64) -> Option<HttpResponse> {
        let entry = entries.get(key)?;
        if entry.is_expired(now, self.ttl_secs) {
            entries.remove(key);
            return None;
        }
        Some(entry.response.clone())
    }

    fn insert(entries: &mut HashMap<String, CacheEntry>, key: String, response: &HttpResponse, now: u64) {
        entries.insert(
            key,
            CacheEntry {
                response: response.clone(),
                inserted_at: now,
            },
        );
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
