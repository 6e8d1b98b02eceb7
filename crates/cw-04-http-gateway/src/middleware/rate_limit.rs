//! Fixed-window rate limiting.
//!
//! The first hit on `rl:<scope>:<identity>` opens a window of
//! `window_secs`; every hit inside it increments the counter and a request
//! is admitted while the counter is `<= limit`. Counters live either in
//! process ([`MemoryBackend`]) or in the shared store ([`StoreBackend`]) so
//! that several gateway instances share one budget.

use crate::domain::config::{RateLimitBackendKind, WindowLimit};
use crate::domain::error::{ApiError, ApiResult};
use async_trait::async_trait;
use cw_telemetry::RATE_LIMITED;
use dashmap::DashMap;
use shared_store::{keys, KvStore, StoreError};
use shared_types::TimeSource;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Counter storage for fixed windows.
#[async_trait]
pub trait RateLimitBackend: Send + Sync {
    /// Record one hit and return the count in the current window,
    /// including this hit.
    async fn hit(&self, key: &str, window_secs: u64) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    reset_at: u64,
}

/// Per-instance counters.
pub struct MemoryBackend {
    windows: DashMap<String, Window>,
    clock: Arc<dyn TimeSource>,
}

impl MemoryBackend {
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
        }
    }

    /// Drop windows that have rolled over. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_secs();
        let before = self.windows.len();
        self.windows.retain(|_, w| now < w.reset_at);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

#[async_trait]
impl RateLimitBackend for MemoryBackend {
    async fn hit(&self, key: &str, window_secs: u64) -> Result<u64, StoreError> {
        let now = self.clock.now_secs();
        let mut window = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now.saturating_add(window_secs),
        });
        if now >= window.reset_at {
            window.count = 0;
            window.reset_at = now.saturating_add(window_secs);
        }
        window.count = window.count.saturating_add(1);
        Ok(window.count)
    }
}

/// Counters in the shared key-value store: `incr`, plus `expire` on the
/// hit that created the key.
pub struct StoreBackend {
    store: Arc<dyn KvStore>,
}

impl StoreBackend {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RateLimitBackend for StoreBackend {
    async fn hit(&self, key: &str, window_secs: u64) -> Result<u64, StoreError> {
        let count = self.store.incr(key).await?;
        if count == 1 {
            self.store.expire(key, window_secs).await?;
        }
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

/// One scope to charge for a request.
#[derive(Debug, Clone, Copy)]
pub struct ScopedLimit<'a> {
    pub scope: &'static str,
    pub identity: &'a str,
    pub limit: WindowLimit,
    /// Error code returned when this scope rejects.
    pub code: &'static str,
}

impl<'a> ScopedLimit<'a> {
    pub fn new(scope: &'static str, identity: &'a str, limit: WindowLimit, code: &'static str) -> Self {
        Self {
            scope,
            identity,
            limit,
            code,
        }
    }
}

/// Rate limiter over a pluggable backend.
#[derive(Clone)]
pub struct RateLimiter {
    backend: Arc<dyn RateLimitBackend>,
    memory: Option<Arc<MemoryBackend>>,
}

impl RateLimiter {
    pub fn new(backend: Arc<dyn RateLimitBackend>) -> Self {
        Self {
            backend,
            memory: None,
        }
    }

    pub fn in_memory(clock: Arc<dyn TimeSource>) -> Self {
        let memory = Arc::new(MemoryBackend::new(clock));
        Self {
            backend: memory.clone(),
            memory: Some(memory),
        }
    }

    pub fn from_kind(
        kind: RateLimitBackendKind,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        match kind {
            RateLimitBackendKind::Memory => Self::in_memory(clock),
            RateLimitBackendKind::Store => Self::new(Arc::new(StoreBackend::new(store))),
        }
    }

    /// Drop rolled-over in-process windows; a no-op for the store backend,
    /// whose keys expire on their own.
    pub fn purge_expired(&self) -> usize {
        self.memory.as_ref().map_or(0, |m| m.purge_expired())
    }

    /// Charge one hit. Backend failures admit the request.
    pub async fn allow(&self, scope: &str, identity: &str, limit: WindowLimit) -> bool {
        let key = keys::rate_limit(scope, identity);
        match self.backend.hit(&key, limit.window_secs).await {
            Ok(count) if count <= limit.limit => true,
            Ok(count) => {
                debug!(scope, identity, count, limit = limit.limit, "rate limit exceeded");
                RATE_LIMITED.with_label_values(&[scope]).inc();
                false
            }
            Err(e) => {
                warn!(scope, identity, error = %e, "rate limit backend failed, admitting");
                true
            }
        }
    }

    /// Charge scopes in order, stopping at the first rejection so later
    /// scopes are not charged for a request that is already refused.
    pub async fn check_all(&self, checks: &[ScopedLimit<'_>]) -> ApiResult<()> {
        for check in checks {
            if !self.allow(check.scope, check.identity, check.limit).await {
                return Err(ApiError::rate_limited(check.code));
            }
        }
        Ok(())
    }
}

/// Subnet bucket for an address: `/24` for IPv4, first four groups for
/// IPv6. Anything that does not parse as an IP has no subnet.
pub fn subnet_key(ip: &str) -> Option<String> {
    match ip.trim().parse::<IpAddr>().ok()? {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            Some(format!("{a}.{b}.{c}"))
        }
        IpAddr::V6(v6) => {
            let s = v6.segments();
            Some(format!("{:x}:{:x}:{:x}:{:x}", s[0], s[1], s[2], s[3]))
        }
    }
}
