//! Eviction bookkeeping: idle entries, eviction reasons and callback dispatch

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Callback notified with every object the pool discards
pub type EvictCallback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Why an object left the pool for good
///
/// # Examples
///
/// ```
/// use recycle_pool::EvictionReason;
///
/// assert_eq!(EvictionReason::Overflow.as_str(), "overflow");
/// assert_eq!(EvictionReason::Reclaimed.to_string(), "reclaimed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionReason {
    /// Returned while the pool already held `capacity` idle objects
    Overflow,

    /// Idle for longer than the configured max age
    Expired,

    /// Collected by a reclamation pass while idle
    Reclaimed,

    /// Removed by an explicit drain or by pool shutdown
    Drained,
}

impl EvictionReason {
    pub const ALL: [EvictionReason; 4] = [
        EvictionReason::Overflow,
        EvictionReason::Expired,
        EvictionReason::Reclaimed,
        EvictionReason::Drained,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionReason::Overflow => "overflow",
            EvictionReason::Expired => "expired",
            EvictionReason::Reclaimed => "reclaimed",
            EvictionReason::Drained => "drained",
        }
    }
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An idle object and the moment it was put into storage
pub(crate) struct Entry<T> {
    pub value: T,
    pub stored_at: Instant,
}

impl<T> Entry<T> {
    pub fn new(value: T, stored_at: Instant) -> Self {
        Self { value, stored_at }
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    pub fn is_expired(&self, max_age: Option<Duration>, now: Instant) -> bool {
        match max_age {
            Some(max_age) => self.idle_for(now) > max_age,
            None => false,
        }
    }
}

/// Hands discarded objects to the eviction callback.
///
/// Must be called without holding the storage lock. A panicking callback
/// is logged and swallowed; the remaining objects are still delivered.
pub(crate) fn notify_evicted<T>(
    callback: Option<&EvictCallback<T>>,
    items: Vec<T>,
    reason: EvictionReason,
) {
    let Some(callback) = callback else {
        // No listener: dropping the objects is all the cleanup there is.
        return;
    };

    for item in items {
        if panic::catch_unwind(AssertUnwindSafe(|| callback(item))).is_err() {
            tracing::warn!(%reason, "eviction callback panicked");
        }
    }
}
