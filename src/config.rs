//! Pool configuration options

use crate::eviction::EvictCallback;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for object pool behavior
///
/// Every option is independent and optional. Values are never rejected:
/// a zero capacity means "unbounded", and a zero max age or reclaim
/// interval switches that feature off.
///
/// # Examples
///
/// ```
/// use recycle_pool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::<i32>::new()
///     .with_capacity(100)
///     .with_max_age(Duration::from_secs(30))
///     .with_evict(|item| println!("dropping {item}"));
///
/// assert_eq!(config.capacity, 100);
/// assert_eq!(config.max_age, Some(Duration::from_secs(30)));
/// assert!(config.on_evict.is_some());
/// ```
pub struct PoolConfiguration<T> {
    /// Maximum number of idle objects kept; `0` keeps any number
    pub capacity: usize,

    /// How long an object may sit idle before it is considered stale
    pub max_age: Option<Duration>,

    /// Called exactly once for every object the pool discards
    pub on_evict: Option<EvictCallback<T>>,

    /// Period of the background reclaimer, if one should run
    pub reclaim_interval: Option<Duration>,

    /// Minimum idle time before the background reclaimer collects an object
    pub reclaim_grace: Option<Duration>,
}

impl<T> Default for PoolConfiguration<T> {
    fn default() -> Self {
        Self {
            capacity: 0,
            max_age: None,
            on_evict: None,
            reclaim_interval: None,
            reclaim_grace: None,
        }
    }
}

impl<T> Clone for PoolConfiguration<T> {
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity,
            max_age: self.max_age,
            on_evict: self.on_evict.clone(),
            reclaim_interval: self.reclaim_interval,
            reclaim_grace: self.reclaim_grace,
        }
    }
}

impl<T> fmt::Debug for PoolConfiguration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfiguration")
            .field("capacity", &self.capacity)
            .field("max_age", &self.max_age)
            .field("on_evict", &self.on_evict.as_ref().map(|_| "<callback>"))
            .field("reclaim_interval", &self.reclaim_interval)
            .field("reclaim_grace", &self.reclaim_grace)
            .finish()
    }
}

impl<T> PoolConfiguration<T> {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the number of idle objects
    ///
    /// Objects returned while the pool already holds `capacity` idle
    /// objects are evicted on the spot.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Expire objects that stayed idle for longer than `max_age`
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Register the eviction callback
    pub fn with_evict<F>(mut self, on_evict: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.on_evict = Some(Arc::new(on_evict));
        self
    }

    /// Run a background reclaimer every `interval`
    ///
    /// # Examples
    ///
    /// ```
    /// use recycle_pool::PoolConfiguration;
    /// use std::time::Duration;
    ///
    /// let config = PoolConfiguration::<i32>::new()
    ///     .with_reclaim_interval(Duration::from_secs(10));
    ///
    /// // Without an explicit grace period an object must survive one full interval.
    /// assert_eq!(config.effective_reclaim_grace(), Duration::from_secs(10));
    /// ```
    pub fn with_reclaim_interval(mut self, interval: Duration) -> Self {
        self.reclaim_interval = Some(interval);
        self
    }

    /// Set how long an object must stay idle before the reclaimer may take it
    pub fn with_reclaim_grace(mut self, grace: Duration) -> Self {
        self.reclaim_grace = Some(grace);
        self
    }

    /// The max age in force, `None` when age checks are off
    pub fn effective_max_age(&self) -> Option<Duration> {
        self.max_age.filter(|age| !age.is_zero())
    }

    /// The reclaimer period in force, `None` when no reclaimer should run
    pub fn effective_reclaim_interval(&self) -> Option<Duration> {
        self.reclaim_interval.filter(|interval| !interval.is_zero())
    }

    /// The reclaimer grace period, defaulting to the reclaim interval
    pub fn effective_reclaim_grace(&self) -> Duration {
        self.reclaim_grace
            .or(self.effective_reclaim_interval())
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfiguration::<u8>::default();
        assert_eq!(config.capacity, 0);
        assert!(config.effective_max_age().is_none());
        assert!(config.on_evict.is_none());
        assert!(config.effective_reclaim_interval().is_none());
        assert_eq!(config.effective_reclaim_grace(), Duration::ZERO);
    }

    #[test]
    fn test_zero_values_are_inert() {
        let config = PoolConfiguration::<u8>::new()
            .with_max_age(Duration::ZERO)
            .with_reclaim_interval(Duration::ZERO);

        assert!(config.effective_max_age().is_none());
        assert!(config.effective_reclaim_interval().is_none());
    }

    #[test]
    fn test_explicit_grace_wins() {
        let config = PoolConfiguration::<u8>::new()
            .with_reclaim_interval(Duration::from_secs(5))
            .with_reclaim_grace(Duration::ZERO);

        assert_eq!(config.effective_reclaim_grace(), Duration::ZERO);
    }

    #[test]
    fn test_clone_shares_callback() {
        let config = PoolConfiguration::<u8>::new().with_evict(|_| {});
        let copy = config.clone();

        let original = config.on_evict.as_ref().unwrap();
        let cloned = copy.on_evict.as_ref().unwrap();
        assert!(Arc::ptr_eq(original, cloned));
    }

    #[test]
    fn test_debug_hides_callback() {
        let config = PoolConfiguration::<u8>::new().with_capacity(3).with_evict(|_| {});
        let rendered = format!("{config:?}");
        assert!(rendered.contains("capacity: 3"));
        assert!(rendered.contains("<callback>"));
    }
}
