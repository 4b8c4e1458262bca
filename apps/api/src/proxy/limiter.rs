use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::time::Instant;
use tracing::{error, info, warn};

pub const DAILY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
pub const MEMORY_MAX_ENTRIES: usize = 10_000;

/// Counts hits per key within a fixed window that starts at the first hit.
#[async_trait]
pub trait UsageCounter: Send + Sync {
    /// Increments the counter for `key` and returns the new count.
    async fn hit(&self, key: &str, window: Duration) -> Result<u64>;
}

/// Shared counter for multi-instance deployments. Holds one multiplexed connection
/// that reconnects on its own after a drop.
pub struct RedisCounter {
    conn: ConnectionManager,
}

impl RedisCounter {
    /// Fails when the server cannot be reached at startup.
    pub async fn connect(client: redis::Client) -> redis::RedisResult<Self> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl UsageCounter for RedisCounter {
    async fn hit(&self, key: &str, window: Duration) -> Result<u64> {
        let mut conn = self.conn.clone();
        let count = redis::cmd("INCR")
            .arg(key)
            .query_async::<_, u64>(&mut conn)
            .await?;
        if count == 1 {
            redis::cmd("EXPIRE")
                .arg(key)
                .arg(window.as_secs())
                .query_async::<_, ()>(&mut conn)
                .await?;
        }
        Ok(count)
    }
}

/// Per-process fallback. Not shared between instances and reset on restart.
pub struct MemoryCounter {
    entries: Mutex<HashMap<String, (u64, Instant)>>,
    max_entries: usize,
}

impl Default for MemoryCounter {
    fn default() -> Self {
        Self::with_capacity(MEMORY_MAX_ENTRIES)
    }
}

impl MemoryCounter {
    /// Above `max_entries` keys the whole map is dropped to bound memory.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl UsageCounter for MemoryCounter {
    async fn hit(&self, key: &str, window: Duration) -> Result<u64> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if entries.len() > self.max_entries {
            warn!("Usage map exceeded {} entries, clearing", self.max_entries);
            entries.clear();
        }

        let entry = entries
            .entry(key.to_string())
            .or_insert((0, now + window));
        if now >= entry.1 {
            *entry = (0, now + window);
        }
        entry.0 += 1;
        Ok(entry.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub count: u64,
    pub limit: u64,
}

impl Usage {
    pub fn allowed(&self) -> bool {
        self.count <= self.limit
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    counter: Arc<dyn UsageCounter>,
    daily_limit: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(counter: Arc<dyn UsageCounter>, daily_limit: u64) -> Self {
        info!("Rate limiter: {daily_limit} requests per IP per day");
        Self {
            counter,
            daily_limit,
            window: DAILY_WINDOW,
        }
    }

    /// Records one request from `ip`. A broken counter lets the request through.
    pub async fn check(&self, ip: &str) -> Usage {
        let key = format!("audit_limit:{ip}");
        let count = match self.counter.hit(&key, self.window).await {
            Ok(count) => count,
            Err(e) => {
                error!("Usage counter unavailable, allowing request: {e:#}");
                0
            }
        };
        Usage {
            count,
            limit: self.daily_limit,
        }
    }
}
