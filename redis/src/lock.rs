//! Redis-backed distributed lock with token ownership.
//!
//! Acquisition is a single `SET key token NX EX ttl`, so lock creation and
//! expiry are one atomic step on the server. Release and extend go through
//! Lua scripts that compare the stored token first: a holder whose TTL
//! lapsed cannot delete or refresh a lock that has since been granted to
//! another caller.

use crate::{connect, lock_unpoisoned, ttl_seconds, RedisConfig};
use cartwheel_core::services::{LockService, LockToken};
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Delete the lock only while it is still ours.
const RELEASE_SCRIPT: &str = r#"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        return redis.call('DEL', KEYS[1])
    end
    return 0
"#;

/// Refresh the TTL only while the lock is still ours.
const EXTEND_SCRIPT: &str = r#"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        return redis.call('EXPIRE', KEYS[1], ARGV[2])
    end
    return 0
"#;

struct HeldLock {
    token: String,
    expires_at: Instant,
}

enum Backend {
    Redis(ConnectionManager),
    InProcess(Mutex<HashMap<String, HeldLock>>),
}

/// Dual-backend [`LockService`] implementation.
pub struct RedisLockService {
    backend: Backend,
}

impl RedisLockService {
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

    /// Purely in-process lock table. Single-node semantics only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::InProcess(Mutex::new(HashMap::new())),
        }
    }

    fn acquire_in_process(
        locks: &Mutex<HashMap<String, HeldLock>>,
        key: &str,
        ttl: Duration,
    ) -> Option<LockToken> {
        let now = Instant::now();
        let mut table = lock_unpoisoned(locks);
        table.retain(|_, held| held.expires_at > now);

        if table.contains_key(key) {
            return None;
        }

        let token = LockToken::generate();
        table.insert(
            key.to_owned(),
            HeldLock {
                token: token.as_str().to_owned(),
                expires_at: now + ttl,
            },
        );
        Some(token)
    }
}

impl LockService for RedisLockService {
    fn acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Option<LockToken>> + Send + '_>> {
        let key = key.to_owned();
        Box::pin(async move {
            match &self.backend {
                Backend::Redis(conn) => {
                    let mut conn = conn.clone();
                    let token = LockToken::generate();
                    let reply: Result<Option<String>, redis::RedisError> = redis::cmd("SET")
                        .arg(&key)
                        .arg(token.as_str())
                        .arg("NX")
                        .arg("EX")
                        .arg(ttl_seconds(ttl))
                        .query_async(&mut conn)
                        .await;

                    match reply {
                        Ok(Some(_)) => Some(token),
                        Ok(None) => None,
                        Err(err) => {
                            // Errors read as "not acquired": callers back off
                            // and retry rather than proceeding unlocked.
                            tracing::warn!(key = %key, error = %err, "lock acquire failed");
                            None
                        }
                    }
                }
                Backend::InProcess(locks) => Self::acquire_in_process(locks, &key, ttl),
            }
        })
    }

    fn release(
        &self,
        key: &str,
        token: &LockToken,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let key = key.to_owned();
        let token = token.clone();
        Box::pin(async move {
            match &self.backend {
                Backend::Redis(conn) => {
                    let mut conn = conn.clone();
                    let released: Result<i64, redis::RedisError> = redis::Script::new(RELEASE_SCRIPT)
                        .key(&key)
                        .arg(token.as_str())
                        .invoke_async(&mut conn)
                        .await;

                    match released {
                        Ok(0) => {
                            tracing::debug!(key = %key, "release skipped, lock no longer ours");
                        }
                        Ok(_) => {}
                        Err(err) => {
                            // The TTL will reap the lock shortly anyway.
                            tracing::warn!(key = %key, error = %err, "lock release failed");
                        }
                    }
                }
                Backend::InProcess(locks) => {
                    let mut table = lock_unpoisoned(locks);
                    if table
                        .get(&key)
                        .is_some_and(|held| held.token == token.as_str())
                    {
                        table.remove(&key);
                    }
                }
            }
        })
    }

    fn extend(
        &self,
        key: &str,
        token: &LockToken,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let key = key.to_owned();
        let token = token.clone();
        Box::pin(async move {
            match &self.backend {
                Backend::Redis(conn) => {
                    let mut conn = conn.clone();
                    let extended: Result<i64, redis::RedisError> = redis::Script::new(EXTEND_SCRIPT)
                        .key(&key)
                        .arg(token.as_str())
                        .arg(ttl_seconds(ttl))
                        .invoke_async(&mut conn)
                        .await;

                    match extended {
                        Ok(applied) => applied == 1,
                        Err(err) => {
                            tracing::warn!(key = %key, error = %err, "lock extend failed");
                            false
                        }
                    }
                }
                Backend::InProcess(locks) => {
                    let now = Instant::now();
                    let mut table = lock_unpoisoned(locks);
                    match table.get_mut(&key) {
                        Some(held) if held.token == token.as_str() && held.expires_at > now => {
                            held.expires_at = now + ttl;
                            true
                        }
                        _ => false,
                    }
                }
            }
        })
    }
}
