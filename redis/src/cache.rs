//! Redis-backed JSON cache with per-entry TTLs.
//!
//! Values travel as JSON strings (`SET`/`SETEX`/`GET`). The in-process
//! backend mirrors the TTL behavior with lazy eviction: expired entries are
//! dropped when read past their deadline and swept on every write.

use crate::{connect, lock_unpoisoned, ttl_seconds, RedisConfig};
use cartwheel_core::services::CacheService;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

enum Backend {
    Redis(ConnectionManager),
    InProcess(Mutex<HashMap<String, Entry>>),
}

/// Dual-backend [`CacheService`] implementation.
pub struct RedisCacheService {
    backend: Backend,
}

impl RedisCacheService {
    /// Connect to Redis, falling back to the in-process backend when the
    /// server is unreachable within the configured budget.
    pub async fn connect(config: &RedisConfig) -> Self {
        match connect(config).await {
            Some(conn) => Self {
                backend: Backend::Redis(conn),
            },
            None => Self::in_memory(),
        }
    }

    /// Purely in-process cache table. Single-node semantics only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::InProcess(Mutex::new(HashMap::new())),
        }
    }
}

impl CacheService for RedisCacheService {
    fn get(&self, key: &str) -> Pin<Box<dyn Future<Output = Option<Value>> + Send + '_>> {
        let key = key.to_owned();
        Box::pin(async move {
            match &self.backend {
                Backend::Redis(conn) => {
                    let mut conn = conn.clone();
                    let raw: Result<Option<String>, redis::RedisError> = conn.get(&key).await;

                    match raw {
                        Ok(Some(json)) => match serde_json::from_str(&json) {
                            Ok(value) => Some(value),
                            Err(err) => {
                                tracing::warn!(key = %key, error = %err, "cached value is not JSON, treating as miss");
                                None
                            }
                        },
                        Ok(None) => None,
                        Err(err) => {
                            tracing::warn!(key = %key, error = %err, "cache get failed, treating as miss");
                            None
                        }
                    }
                }
                Backend::InProcess(entries) => {
                    let now = Instant::now();
                    let mut table = lock_unpoisoned(entries);
                    match table.get(&key) {
                        Some(entry) if entry.is_expired(now) => {
                            table.remove(&key);
                            None
                        }
                        Some(entry) => Some(entry.value.clone()),
                        None => None,
                    }
                }
            }
        })
    }

    fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let key = key.to_owned();
        Box::pin(async move {
            match &self.backend {
                Backend::Redis(conn) => {
                    let mut conn = conn.clone();
                    let json = value.to_string();

                    let written: Result<(), redis::RedisError> = match ttl {
                        Some(ttl) => conn.set_ex(&key, json, ttl_seconds(ttl)).await,
                        None => conn.set(&key, json).await,
                    };

                    if let Err(err) = written {
                        tracing::warn!(key = %key, error = %err, "cache set failed, dropping write");
                    }
                }
                Backend::InProcess(entries) => {
                    let now = Instant::now();
                    let mut table = lock_unpoisoned(entries);
                    table.retain(|_, entry| !entry.is_expired(now));
                    table.insert(
                        key,
                        Entry {
                            value,
                            expires_at: ttl.map(|ttl| now + ttl),
                        },
                    );
                }
            }
        })
    }

    fn delete(&self, key: &str) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let key = key.to_owned();
        Box::pin(async move {
            match &self.backend {
                Backend::Redis(conn) => {
                    let mut conn = conn.clone();
                    let deleted: Result<(), redis::RedisError> = conn.del(&key).await;
                    if let Err(err) = deleted {
                        tracing::warn!(key = %key, error = %err, "cache delete failed");
                    }
                }
                Backend::InProcess(entries) => {
                    lock_unpoisoned(entries).remove(&key);
                }
            }
        })
    }

    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            match &self.backend {
                Backend::Redis(conn) => {
                    let mut conn = conn.clone();
                    let flushed: Result<(), redis::RedisError> =
                        redis::cmd("FLUSHDB").query_async(&mut conn).await;
                    if let Err(err) = flushed {
                        tracing::warn!(error = %err, "cache clear failed");
                    }
                }
                Backend::InProcess(entries) => {
                    lock_unpoisoned(entries).clear();
                }
            }
        })
    }
}
