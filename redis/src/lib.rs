//! Redis-backed implementations of the cartwheel lock and cache services.
//!
//! # Architecture
//!
//! Both services are dual-backend:
//!
//! ```text
//! ┌────────────────┐   reachable    ┌─────────────────────┐
//! │ connect(config)│ ─────────────► │ Redis               │
//! │                │                │ (ConnectionManager) │
//! │                │   otherwise    ├─────────────────────┤
//! │                │ ─────────────► │ in-process table    │
//! └────────────────┘                │ (single node only)  │
//!                                   └─────────────────────┘
//! ```
//!
//! The backend is chosen once at construction. The in-process fallback keeps
//! the same atomic semantics within one process, which is the documented
//! degradation mode for single-node deployments and for tests. After
//! construction both services are infallible at the call site: a Redis error
//! reads as "lock not acquired" or "cache miss" and is logged, never
//! propagated.
//!
//! Lock keys hold a random ownership token as their value; release and
//! extend run compare-and-delete / compare-and-expire Lua scripts so only
//! the current holder can act on a lock.

pub mod cache;
pub mod lock;

pub use cache::RedisCacheService;
pub use lock::RedisLockService;

use redis::aio::ConnectionManager;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Connection settings for the Redis backend.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    /// Redis connection URL, e.g. `redis://127.0.0.1:6379`.
    pub url: String,
    /// Budget for establishing the initial connection before falling back
    /// to the in-process backend.
    pub connect_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_owned(),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

impl RedisConfig {
    /// Read the configuration from the environment.
    ///
    /// `REDIS_URL` overrides the connection URL; everything else keeps its
    /// default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("REDIS_URL") {
            config.url = url;
        }
        config
    }
}

/// Try to establish a pooled connection within the configured budget.
///
/// Returns `None` when the client cannot be built, the connection errors,
/// or the timeout elapses; callers fall back to the in-process backend.
pub(crate) async fn connect(config: &RedisConfig) -> Option<ConnectionManager> {
    let client = match redis::Client::open(config.url.as_str()) {
        Ok(client) => client,
        Err(err) => {
            tracing::warn!(url = %config.url, error = %err, "invalid Redis URL, using in-process backend");
            return None;
        }
    };

    match tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client)).await {
        Ok(Ok(conn)) => {
            tracing::info!(url = %config.url, "connected to Redis");
            Some(conn)
        }
        Ok(Err(err)) => {
            tracing::warn!(url = %config.url, error = %err, "Redis unreachable, using in-process backend");
            None
        }
        Err(_) => {
            tracing::warn!(
                url = %config.url,
                timeout_ms = config.connect_timeout.as_millis(),
                "Redis connection timed out, using in-process backend"
            );
            None
        }
    }
}

/// Lock a mutex, recovering the guard if a test thread panicked while
/// holding it.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clamp a TTL to whole seconds for Redis `EX`, never below one second.
pub(crate) fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
