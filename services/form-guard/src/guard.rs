// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Anti-spam submission guard.
//!
//! Two checks run before a form is forwarded:
//!
//! 1. Honeypot: a hidden field that must stay empty. A filled honeypot is
//!    dropped silently; the caller reports success and forwards nothing.
//! 2. Sliding-window limit: per category, at most `max_submissions` recorded
//!    submissions within the trailing window.
//!
//! History is a JSON array of epoch milliseconds under
//! `form_submissions_<category>`. Expired entries are pruned lazily on
//! every read. Checking never writes; only [`SubmissionGuard::record_submission`]
//! does, and only after a successful forward, so failures cost no quota.
//!
//! Unreadable or corrupted history is treated as empty (fail open) so a
//! storage fault cannot lock a legitimate visitor out. The guard is soft:
//! the read-modify-write is not atomic and concurrent requests may both pass.

use crate::config::GuardConfig;
use crate::forms::FormCategory;
use crate::store::{KeyValueStore, StoreError};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

pub const STORAGE_KEY_PREFIX: &str = "form_submissions_";

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replay.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = instant;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += ChronoDuration::from_std(by).unwrap_or_else(|_| ChronoDuration::zero());
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|n| *n).unwrap_or_else(|p| *p.into_inner())
    }
}

/// Storage key for a category's history.
pub fn storage_key(category: FormCategory) -> String {
    format!("{STORAGE_KEY_PREFIX}{}", category.as_str())
}

/// True iff the honeypot is empty after trimming.
pub fn validate_honeypot(value: &str) -> bool {
    value.trim().is_empty()
}

/// Honeypot plus sliding-window submission guard.
#[derive(Clone)]
pub struct SubmissionGuard {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    max_submissions: u32,
    window_ms: i64,
}

impl SubmissionGuard {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &GuardConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            max_submissions: config.max_submissions,
            window_ms: i64::try_from(config.window_duration().as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// See [`validate_honeypot`].
    pub fn validate_honeypot(&self, value: &str) -> bool {
        validate_honeypot(value)
    }

    /// True iff fewer than `max_submissions` unexpired entries exist.
    /// Never mutates storage.
    pub fn check_rate_limit(&self, category: FormCategory) -> bool {
        let now = self.now_ms();
        let count = self.active_entries(category, now).len();
        let allowed = count < self.max_submissions as usize;
        if !allowed {
            debug!(%category, count, max = self.max_submissions, "Submission rate limit reached");
        }
        allowed
    }

    /// Prune, append the current instant and persist.
    pub fn record_submission(&self, category: FormCategory) -> Result<(), StoreError> {
        let now = self.now_ms();
        let mut entries = self.active_entries(category, now);
        entries.push(now);

        let json = serde_json::to_string(&entries)?;
        self.store.set(&storage_key(category), &json)?;
        debug!(%category, count = entries.len(), "Submission recorded");
        Ok(())
    }

    /// Submissions left in the current window.
    pub fn remaining(&self, category: FormCategory) -> u32 {
        let used = self.active_entries(category, self.now_ms()).len();
        (self.max_submissions as usize).saturating_sub(used) as u32
    }

    /// Time until the next submission is allowed; `None` if allowed now.
    pub fn retry_after(&self, category: FormCategory) -> Option<Duration> {
        let now = self.now_ms();
        let entries = self.active_entries(category, now);
        if entries.len() < self.max_submissions as usize {
            return None;
        }

        // A zero cap never frees up; report a full window.
        let Some(idx) = entries.len().checked_sub(self.max_submissions as usize) else {
            return Some(self.window());
        };
        let Some(&oldest_blocking) = entries.get(idx) else {
            return Some(self.window());
        };
        // The entry that has to expire is the one `max` places from the end.
        let frees_at = oldest_blocking.saturating_add(self.window_ms);
        Some(Duration::from_millis(frees_at.saturating_sub(now).max(0) as u64))
    }

    fn window(&self) -> Duration {
        Duration::from_millis(u64::try_from(self.window_ms).unwrap_or(0))
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    /// Stored entries still inside the window, oldest first.
    fn active_entries(&self, category: FormCategory, now: i64) -> Vec<i64> {
        let mut entries = self.load(category);
        entries.retain(|&ts| now.saturating_sub(ts) < self.window_ms);
        entries.sort_unstable();
        entries
    }

    /// Read history; storage or parse failures count as no history.
    fn load(&self, category: FormCategory) -> Vec<i64> {
        let key = storage_key(category);
        match self.store.get(&key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(%key, error = %e, "Unparsable submission history, treating as empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(%key, error = %e, "Submission history unavailable, treating as empty");
                Vec::new()
            }
        }
    }
}

/// Remove history keys whose entries have all expired. Returns the number
/// of keys removed. Keys that are not submission history are left alone.
pub fn compact(store: &dyn KeyValueStore, window: Duration, now: DateTime<Utc>) -> Result<usize, StoreError> {
    let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
    let now = now.timestamp_millis();
    let mut removed = 0;

    for key in store.keys()? {
        if !key.contains(STORAGE_KEY_PREFIX) {
            continue;
        }
        let Some(raw) = store.get(&key)? else {
            continue;
        };
        let expired = match serde_json::from_str::<Vec<i64>>(&raw) {
            Ok(entries) => entries.iter().all(|&ts| now.saturating_sub(ts) >= window_ms),
            Err(_) => true,
        };
        if expired {
            store.remove(&key)?;
            removed += 1;
        }
    }

    Ok(removed)
}
