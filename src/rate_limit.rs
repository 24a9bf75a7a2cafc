// Fixed-window limiter for admin writes. A burst straddling reset_at can see
// up to twice the limit; that is accepted.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::metrics::{RATE_LIMIT_ENTRIES, RATE_LIMIT_SWEPT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

// Rate limit entry - one per admin identity
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: i64, // epoch millis
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: i64,
}

impl RateLimitDecision {
    // seconds until the window closes, rounded up
    pub fn reset_in_seconds(&self, now_ms: i64) -> i64 {
        let left = self.reset_at - now_ms;
        if left <= 0 { 0 } else { (left + 999) / 1000 }
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct RateLimiter {
    config: RateLimitConfig,
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
        }
    }

    pub fn check(&self, identity: &str) -> RateLimitDecision {
        self.check_at(identity, now_ms())
    }

    // The entry guard holds the shard lock, so read/decide/update for one
    // identity never interleaves with another call for the same identity.
    pub fn check_at(&self, identity: &str, now_ms: i64) -> RateLimitDecision {
        let max = self.config.max_requests;
        let window_ms = self.config.window_ms();

        match self.entries.entry(identity.to_string()) {
            Entry::Vacant(slot) => {
                let reset_at = now_ms.saturating_add(window_ms);
                slot.insert(RateLimitEntry { count: 1, reset_at });
                RateLimitDecision {
                    allowed: true,
                    remaining: max.saturating_sub(1),
                    reset_at,
                }
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();

                // window expired..? start a fresh one
                if now_ms > entry.reset_at {
                    *entry = RateLimitEntry {
                        count: 1,
                        reset_at: now_ms.saturating_add(window_ms),
                    };
                    return RateLimitDecision {
                        allowed: true,
                        remaining: max.saturating_sub(1),
                        reset_at: entry.reset_at,
                    };
                }

                if entry.count < max {
                    entry.count += 1;
                    return RateLimitDecision {
                        allowed: true,
                        remaining: max - entry.count,
                        reset_at: entry.reset_at,
                    };
                }

                // over limit, entry left untouched
                RateLimitDecision {
                    allowed: false,
                    remaining: 0,
                    reset_at: entry.reset_at,
                }
            }
        }
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(now_ms())
    }

    // drops entries whose window already closed, returns how many went
    pub fn sweep_at(&self, now_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now_ms <= entry.reset_at);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> SweeperHandle {
        let limiter = Arc::clone(self);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval(every);
            // first tick fires immediately
            ticker.tick().await;

            tracing::info!(interval = ?every, "Rate limit sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        RATE_LIMIT_SWEPT.inc_by(removed as f64);
                        RATE_LIMIT_ENTRIES.set(limiter.len() as f64);
                        tracing::debug!(removed, remaining = limiter.len(), "Swept rate limit store");
                    }
                    _ = &mut stop_rx => break,
                }
            }

            tracing::info!("Rate limit sweeper stopped");
        });

        SweeperHandle {
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }
}

pub struct SweeperHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
