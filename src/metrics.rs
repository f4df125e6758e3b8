//! Metrics collection and export for object pools

use crate::eviction::EvictionReason;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Point-in-time metrics for a pool
///
/// # Examples
///
/// ```
/// use recycle_pool::{Context, Pool, PoolConfiguration};
/// use std::convert::Infallible;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let pool = Pool::new(|_: &Context| Ok::<_, Infallible>(0u64), PoolConfiguration::new());
/// let ctx = Context::background();
///
/// let item = pool.get(&ctx).await.unwrap();
/// pool.put(item);
/// let _again = pool.get(&ctx).await.unwrap();
///
/// let metrics = pool.get_metrics();
/// assert_eq!(metrics.created, 1);
/// assert_eq!(metrics.reused, 1);
/// assert_eq!(metrics.hit_ratio, 0.5);
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "metrics", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Objects built by the factory
    pub created: usize,

    /// `get` calls served from idle storage
    pub reused: usize,

    /// Objects accepted back into storage by `put`
    pub returned: usize,

    /// Factory calls that failed
    pub construction_failures: usize,

    /// Objects rejected by `put` because the pool was full
    pub evicted_overflow: usize,

    /// Objects discarded for exceeding the max age
    pub evicted_expired: usize,

    /// Objects collected by a reclamation pass
    pub evicted_reclaimed: usize,

    /// Objects removed by drain or shutdown
    pub evicted_drained: usize,

    /// Objects idle right now
    pub idle_objects: usize,

    /// Idle capacity, `0` when unbounded
    pub max_capacity: usize,

    /// Share of successful `get` calls served without construction (0.0 to 1.0)
    pub hit_ratio: f64,
}

impl PoolMetrics {
    /// Evictions for one reason
    pub fn evicted(&self, reason: EvictionReason) -> usize {
        match reason {
            EvictionReason::Overflow => self.evicted_overflow,
            EvictionReason::Expired => self.evicted_expired,
            EvictionReason::Reclaimed => self.evicted_reclaimed,
            EvictionReason::Drained => self.evicted_drained,
        }
    }

    /// Evictions for all reasons
    pub fn total_evicted(&self) -> usize {
        EvictionReason::ALL.iter().map(|reason| self.evicted(*reason)).sum()
    }

    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("created".to_string(), self.created.to_string());
        metrics.insert("reused".to_string(), self.reused.to_string());
        metrics.insert("returned".to_string(), self.returned.to_string());
        metrics.insert("construction_failures".to_string(), self.construction_failures.to_string());
        for reason in EvictionReason::ALL {
            metrics.insert(format!("evicted_{reason}"), self.evicted(reason).to_string());
        }
        metrics.insert("idle_objects".to_string(), self.idle_objects.to_string());
        metrics.insert("max_capacity".to_string(), self.max_capacity.to_string());
        metrics.insert("hit_ratio".to_string(), format!("{:.2}", self.hit_ratio));
        metrics
    }
}

/// Metrics exporter for Prometheus format
#[cfg(feature = "metrics")]
pub struct MetricsExporter;

#[cfg(feature = "metrics")]
impl MetricsExporter {
    /// Render metrics in the Prometheus text exposition format
    ///
    /// Every series carries a `pool` label plus the given tags.
    ///
    /// # Examples
    ///
    /// ```
    /// use recycle_pool::{Context, Pool, PoolConfiguration};
    /// use std::collections::HashMap;
    /// use std::convert::Infallible;
    ///
    /// let pool = Pool::new(|_: &Context| Ok::<_, Infallible>(0u8), PoolConfiguration::new());
    /// pool.put(1);
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("my_pool", Some(&tags)).unwrap();
    /// assert!(output.contains("objectpool_objects_idle"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> prometheus::Result<String> {
        use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

        let registry = Registry::new_custom(
            Some("objectpool".to_string()),
            Some(Self::labels(pool_name, tags)),
        )?;

        let idle = IntGauge::new("objects_idle", "Current idle objects")?;
        idle.set(metrics.idle_objects as i64);
        registry.register(Box::new(idle))?;

        let capacity = IntGauge::new("capacity", "Idle capacity, 0 when unbounded")?;
        capacity.set(metrics.max_capacity as i64);
        registry.register(Box::new(capacity))?;

        let counters = [
            ("objects_created_total", "Objects built by the factory", metrics.created),
            ("objects_reused_total", "Gets served from idle storage", metrics.reused),
            ("objects_returned_total", "Objects accepted back into storage", metrics.returned),
            ("construction_failures_total", "Failed factory calls", metrics.construction_failures),
        ];
        for (name, help, value) in counters {
            let counter = IntCounter::new(name, help)?;
            counter.inc_by(value as u64);
            registry.register(Box::new(counter))?;
        }

        let evicted = IntCounterVec::new(
            Opts::new("objects_evicted_total", "Objects discarded by the pool"),
            &["reason"],
        )?;
        for reason in EvictionReason::ALL {
            evicted
                .with_label_values(&[reason.as_str()])
                .inc_by(metrics.evicted(reason) as u64);
        }
        registry.register(Box::new(evicted))?;

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }

    fn labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> HashMap<String, String> {
        let mut labels = tags.cloned().unwrap_or_default();
        labels.insert("pool".to_string(), pool_name.to_string());
        labels
    }
}

/// Internal metrics tracker
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub created: AtomicUsize,
    pub reused: AtomicUsize,
    pub returned: AtomicUsize,
    pub construction_failures: AtomicUsize,
    evicted_overflow: AtomicUsize,
    evicted_expired: AtomicUsize,
    evicted_reclaimed: AtomicUsize,
    evicted_drained: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_eviction(&self, reason: EvictionReason, count: usize) {
        let counter = match reason {
            EvictionReason::Overflow => &self.evicted_overflow,
            EvictionReason::Expired => &self.evicted_expired,
            EvictionReason::Reclaimed => &self.evicted_reclaimed,
            EvictionReason::Drained => &self.evicted_drained,
        };
        counter.fetch_add(count, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, idle: usize, capacity: usize) -> PoolMetrics {
        let created = self.created.load(Ordering::Relaxed);
        let reused = self.reused.load(Ordering::Relaxed);
        let served = created + reused;
        let hit_ratio = if served > 0 {
            reused as f64 / served as f64
        } else {
            0.0
        };

        PoolMetrics {
            created,
            reused,
            returned: self.returned.load(Ordering::Relaxed),
            construction_failures: self.construction_failures.load(Ordering::Relaxed),
            evicted_overflow: self.evicted_overflow.load(Ordering::Relaxed),
            evicted_expired: self.evicted_expired.load(Ordering::Relaxed),
            evicted_reclaimed: self.evicted_reclaimed.load(Ordering::Relaxed),
            evicted_drained: self.evicted_drained.load(Ordering::Relaxed),
            idle_objects: idle,
            max_capacity: capacity,
            hit_ratio,
        }
    }
}
