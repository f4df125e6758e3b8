//! Idle object storage shared by a pool, its guards and its reclaimer

use crate::config::PoolConfiguration;
use crate::eviction::{notify_evicted, EvictCallback, EvictionReason, Entry};
use crate::metrics::{MetricsTracker, PoolMetrics};

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

struct State<T> {
    /// Oldest entry at the front.
    items: VecDeque<Entry<T>>,
    closed: bool,
}

/// FIFO store of idle objects.
///
/// All access to `items` goes through one mutex. The lock is never held
/// while the eviction callback runs.
pub(crate) struct Storage<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    max_age: Option<Duration>,
    on_evict: Option<EvictCallback<T>>,
    pub metrics: MetricsTracker,
}

impl<T> Storage<T> {
    pub fn new(config: &PoolConfiguration<T>) -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            capacity: config.capacity,
            max_age: config.effective_max_age(),
            on_evict: config.on_evict.clone(),
            metrics: MetricsTracker::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    pub fn idle_count(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Pop the oldest idle object that has not outlived the max age.
    ///
    /// Stale entries in front of it are evicted along the way.
    pub fn take(&self) -> Option<T> {
        let now = Instant::now();
        let mut expired = Vec::new();

        let found = {
            let mut state = self.state.lock();
            loop {
                match state.items.pop_front() {
                    Some(entry) if entry.is_expired(self.max_age, now) => expired.push(entry.value),
                    Some(entry) => break Some(entry.value),
                    None => break None,
                }
            }
        };

        self.evict(expired, EvictionReason::Expired);

        if found.is_some() {
            self.metrics.reused.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("reusing idle object");
        }
        found
    }

    /// Store an object for reuse, or evict it if there is no room.
    pub fn put(&self, value: T) {
        let rejected = {
            let mut state = self.state.lock();
            if state.closed {
                Some((value, EvictionReason::Drained))
            } else if self.capacity > 0 && state.items.len() >= self.capacity {
                Some((value, EvictionReason::Overflow))
            } else {
                state.items.push_back(Entry::new(value, Instant::now()));
                None
            }
        };

        match rejected {
            Some((value, reason)) => self.evict(vec![value], reason),
            None => {
                self.metrics.returned.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("stored idle object");
            }
        }
    }

    /// Collector pass over the idle objects.
    ///
    /// Entries past the max age are evicted as expired, entries idle for
    /// at least `min_idle` as reclaimed. Returns how many were evicted.
    pub fn reclaim(&self, min_idle: Duration) -> usize {
        let now = Instant::now();
        let mut expired = Vec::new();
        let mut reclaimed = Vec::new();

        {
            let mut state = self.state.lock();
            let items = std::mem::take(&mut state.items);
            for entry in items {
                if entry.is_expired(self.max_age, now) {
                    expired.push(entry.value);
                } else if entry.idle_for(now) >= min_idle {
                    reclaimed.push(entry.value);
                } else {
                    state.items.push_back(entry);
                }
            }
        }

        let count = expired.len() + reclaimed.len();
        self.evict(expired, EvictionReason::Expired);
        self.evict(reclaimed, EvictionReason::Reclaimed);
        count
    }

    /// Evict every idle object. Returns how many were evicted.
    pub fn drain(&self) -> usize {
        let drained: Vec<T> = {
            let mut state = self.state.lock();
            state.items.drain(..).map(|entry| entry.value).collect()
        };

        let count = drained.len();
        self.evict(drained, EvictionReason::Drained);
        count
    }

    /// Drain, and evict everything returned from now on.
    pub fn close(&self) -> usize {
        self.state.lock().closed = true;
        self.drain()
    }

    pub fn get_metrics(&self) -> PoolMetrics {
        self.metrics.get_metrics(self.idle_count(), self.capacity)
    }

    fn evict(&self, items: Vec<T>, reason: EvictionReason) {
        if items.is_empty() {
            return;
        }

        self.metrics.record_eviction(reason, items.len());
        tracing::debug!(%reason, count = items.len(), "evicting objects");
        notify_evicted(self.on_evict.as_ref(), items, reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recording(config: PoolConfiguration<u32>) -> (Storage<u32>, Arc<Mutex<Vec<u32>>>) {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        let storage = Storage::new(&config.with_evict(move |item| sink.lock().push(item)));
        (storage, evicted)
    }

    #[test]
    fn test_fifo_order() {
        let (storage, _) = recording(PoolConfiguration::new());
        for item in 0..3 {
            storage.put(item);
        }

        assert_eq!(storage.take(), Some(0));
        assert_eq!(storage.take(), Some(1));
        assert_eq!(storage.take(), Some(2));
        assert_eq!(storage.take(), None);
    }

    #[test]
    fn test_overflow_is_evicted() {
        let (storage, evicted) = recording(PoolConfiguration::new().with_capacity(2));
        storage.put(1);
        storage.put(2);
        storage.put(3);

        assert_eq!(storage.idle_count(), 2);
        assert_eq!(*evicted.lock(), vec![3]);
        assert_eq!(storage.get_metrics().evicted_overflow, 1);
    }

    #[test]
    fn test_take_skips_only_stale_entries() {
        let (storage, evicted) =
            recording(PoolConfiguration::new().with_max_age(Duration::from_millis(30)));
        storage.put(1);
        storage.put(2);
        std::thread::sleep(Duration::from_millis(50));
        storage.put(3);

        assert_eq!(storage.take(), Some(3));
        assert_eq!(*evicted.lock(), vec![1, 2]);
        assert_eq!(storage.idle_count(), 0);
    }

    #[test]
    fn test_put_refreshes_idle_timestamp() {
        let (storage, evicted) =
            recording(PoolConfiguration::new().with_max_age(Duration::from_millis(90)));
        storage.put(1);
        std::thread::sleep(Duration::from_millis(60));

        let item = storage.take().unwrap();
        storage.put(item);
        std::thread::sleep(Duration::from_millis(60));

        // 120ms since the first put, but only 60ms since the last one.
        assert_eq!(storage.take(), Some(1));
        assert!(evicted.lock().is_empty());
        assert_eq!(storage.get_metrics().evicted_expired, 0);
    }

    #[test]
    fn test_reclaim_respects_min_idle() {
        let (storage, evicted) = recording(PoolConfiguration::new());
        storage.put(1);
        std::thread::sleep(Duration::from_millis(40));
        storage.put(2);

        assert_eq!(storage.reclaim(Duration::from_millis(30)), 1);
        assert_eq!(*evicted.lock(), vec![1]);
        assert_eq!(storage.reclaim(Duration::ZERO), 1);
        assert_eq!(*evicted.lock(), vec![1, 2]);

        let metrics = storage.get_metrics();
        assert_eq!(metrics.evicted_reclaimed, 2);
        assert_eq!(metrics.idle_objects, 0);
    }

    #[test]
    fn test_reclaim_classifies_expired() {
        let (storage, _) = recording(PoolConfiguration::new().with_max_age(Duration::from_millis(10)));
        storage.put(1);
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(storage.reclaim(Duration::from_secs(3600)), 1);
        assert_eq!(storage.get_metrics().evicted_expired, 1);
    }

    #[test]
    fn test_close_evicts_late_returns() {
        let (storage, evicted) = recording(PoolConfiguration::new());
        storage.put(1);

        assert_eq!(storage.close(), 1);
        storage.put(2);

        assert_eq!(*evicted.lock(), vec![1, 2]);
        assert_eq!(storage.idle_count(), 0);
        assert_eq!(storage.get_metrics().evicted_drained, 2);
    }
}
