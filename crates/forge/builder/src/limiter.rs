//! Sliding-window rate limiter keyed by (subject, operation)
//!
//! Each key owns its own timestamp deque behind its own mutex. The outer
//! map lock is only held to find or create a key's entry, so requests on
//! different keys never wait on each other.

use crate::config::RateLimitConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

type Key = (String, String);

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Recorded; `remaining` further requests fit in the window
    Allowed { remaining: usize },
    /// Rejected; the oldest request leaves the window after `retry_after`
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

pub struct SlidingWindowLimiter {
    window: Duration,
    max_requests: usize,
    keys: RwLock<HashMap<Key, Arc<Mutex<VecDeque<Instant>>>>>,
}

impl SlidingWindowLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            keys: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(Duration::from_secs(config.window_secs), config.max_requests)
    }

    async fn entry(&self, subject: &str, operation: &str) -> Arc<Mutex<VecDeque<Instant>>> {
        let key = (subject.to_string(), operation.to_string());
        if let Some(entry) = self.keys.read().await.get(&key) {
            return entry.clone();
        }
        self.keys.write().await.entry(key).or_default().clone()
    }

    /// Check the window for `(subject, operation)` and record the request
    /// if it fits
    pub async fn try_acquire(&self, subject: &str, operation: &str) -> RateDecision {
        let entry = self.entry(subject, operation).await;
        let mut timestamps = entry.lock().await;

        let now = Instant::now();
        while let Some(oldest) = timestamps.front() {
            if now.duration_since(*oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests {
            let retry_after = timestamps
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            return RateDecision::Limited { retry_after };
        }

        timestamps.push_back(now);
        RateDecision::Allowed {
            remaining: self.max_requests - timestamps.len(),
        }
    }

    /// Drop keys with no request left in the window. Returns how many
    /// were dropped.
    pub async fn prune_idle(&self) -> usize {
        let mut keys = self.keys.write().await;
        let now = Instant::now();
        let before = keys.len();
        keys.retain(|_, entry| {
            // a clone outside the map means an acquire is in flight
            if Arc::strong_count(entry) > 1 {
                return true;
            }
            match entry.try_lock() {
                Ok(timestamps) => timestamps
                    .back()
                    .is_some_and(|newest| now.duration_since(*newest) < self.window),
                Err(_) => true,
            }
        });
        before - keys.len()
    }

    /// Keys currently tracked
    pub async fn tracked_keys(&self) -> usize {
        self.keys.read().await.len()
    }

    /// Requests currently counted for a key
    pub async fn in_window(&self, subject: &str, operation: &str) -> usize {
        let entry = self.entry(subject, operation).await;
        let timestamps = entry.lock().await;
        let now = Instant::now();
        timestamps
            .iter()
            .filter(|t| now.duration_since(**t) < self.window)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 2);
        assert_eq!(
            limiter.try_acquire("alice", "start").await,
            RateDecision::Allowed { remaining: 1 }
        );
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.try_acquire("alice", "start").await.is_allowed());
        assert_eq!(
            limiter.try_acquire("alice", "start").await,
            RateDecision::Limited {
                retry_after: Duration::from_secs(30)
            }
        );

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.try_acquire("alice", "start").await.is_allowed());
        assert_eq!(limiter.in_window("alice", "start").await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 1);
        assert!(limiter.try_acquire("alice", "start").await.is_allowed());
        assert!(!limiter.try_acquire("alice", "start").await.is_allowed());
        assert!(limiter.try_acquire("alice", "cancel").await.is_allowed());
        assert!(limiter.try_acquire("bob", "start").await.is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_keys_are_pruned() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 1);
        for subject in ["alice", "bob", "carol"] {
            assert!(limiter.try_acquire(subject, "start").await.is_allowed());
        }
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.try_acquire("dave", "start").await.is_allowed());
        assert_eq!(limiter.prune_idle().await, 0);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(limiter.prune_idle().await, 3);
        assert_eq!(limiter.tracked_keys().await, 1);
        assert!(!limiter.try_acquire("dave", "start").await.is_allowed());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(limiter.prune_idle().await, 1);
        assert_eq!(limiter.tracked_keys().await, 0);
        assert!(limiter.try_acquire("alice", "start").await.is_allowed());
    }

    #[tokio::test]
    async fn test_concurrent_requests_on_one_key() {
        let limiter = Arc::new(SlidingWindowLimiter::new(Duration::from_secs(60), 10));
        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.try_acquire("alice", "start").await })
            })
            .collect();
        let mut allowed = 0;
        for task in tasks {
            if task.await.unwrap().is_allowed() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 10);
        assert_eq!(limiter.in_window("alice", "start").await, 10);
    }
}
