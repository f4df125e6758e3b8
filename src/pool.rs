//! Core object pool implementation

use crate::config::PoolConfiguration;
use crate::context::Context;
use crate::factory::Factory;
use crate::metrics::PoolMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::MetricsExporter;
use crate::reclaimer::Reclaimer;
use crate::storage::Storage;

use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// A pooled object that automatically returns to the pool when dropped
pub struct PooledObject<T> {
    value: Option<T>,
    storage: Arc<Storage<T>>,
}

impl<T> PooledObject<T> {
    fn new(value: T, storage: Arc<Storage<T>>) -> Self {
        Self {
            value: Some(value),
            storage,
        }
    }

    /// Take the object out for good; it is neither returned nor evicted
    pub fn into_inner(mut self) -> T {
        self.value.take().expect("Value already taken")
    }
}

impl<T> Deref for PooledObject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("Value already taken")
    }
}

impl<T> DerefMut for PooledObject<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("Value already taken")
    }
}

impl<T> Drop for PooledObject<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.storage.put(value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledObject").field(&self.value).finish()
    }
}

/// Thread-safe pool that builds objects on demand and recycles them
///
/// `get` hands out the oldest idle object that has not outlived the max
/// age and otherwise asks the factory for a new one. `put` takes an
/// object back unless the pool already holds `capacity` idle objects, in
/// which case the object is evicted. Every object that leaves the pool
/// for good (overflow, expiry, reclamation, drain) is passed to the
/// eviction callback exactly once.
///
/// Cloning a pool is cheap and yields another handle to the same pool.
/// When the last handle is dropped the reclaimer stops, idle objects are
/// drained, and objects returned later through [`PooledObject`] guards
/// are evicted on return.
///
/// # Examples
///
/// ```
/// use recycle_pool::{Context, Pool, PoolConfiguration};
/// use std::convert::Infallible;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let next = AtomicU32::new(0);
/// let pool = Pool::new(
///     move |_: &Context| Ok::<_, Infallible>(next.fetch_add(1, Ordering::Relaxed)),
///     PoolConfiguration::new().with_capacity(2),
/// );
/// let ctx = Context::background();
///
/// let first = pool.get(&ctx).await.unwrap();
/// pool.put(first);
/// assert_eq!(pool.get(&ctx).await.unwrap(), first);
/// assert_eq!(pool.get(&ctx).await.unwrap(), 1);
/// # }
/// ```
pub struct Pool<T, F> {
    inner: Arc<PoolInner<T, F>>,
}

struct PoolInner<T, F> {
    factory: F,
    storage: Arc<Storage<T>>,
    reclaimer: Option<Reclaimer>,
}

impl<T, F> Drop for PoolInner<T, F> {
    fn drop(&mut self) {
        drop(self.reclaimer.take());

        let drained = self.storage.close();
        tracing::debug!(drained, "pool shut down");
    }
}

impl<T, F> Clone for Pool<T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, F> fmt::Debug for Pool<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = &self.inner.storage;
        f.debug_struct("Pool")
            .field("idle", &storage.idle_count())
            .field("capacity", &storage.capacity())
            .field("max_age", &storage.max_age())
            .field("reclaimer", &self.inner.reclaimer.is_some())
            .finish()
    }
}

impl<T, F> Pool<T, F>
where
    T: Send + 'static,
    F: Factory<T>,
{
    /// Create a pool around a factory
    ///
    /// Starts the background reclaimer when the configuration asks for
    /// one. If the thread cannot be spawned the pool still works, only
    /// without background reclamation.
    pub fn new(factory: F, config: PoolConfiguration<T>) -> Self {
        let storage = Arc::new(Storage::new(&config));

        let reclaimer = config.effective_reclaim_interval().and_then(|interval| {
            let grace = config.effective_reclaim_grace();
            match Reclaimer::spawn(Arc::clone(&storage), interval, grace) {
                Ok(reclaimer) => Some(reclaimer),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to start reclaimer, idle objects are only reclaimed on demand");
                    None
                }
            }
        });

        tracing::debug!(
            capacity = config.capacity,
            max_age = ?config.effective_max_age(),
            reclaim_interval = ?config.effective_reclaim_interval(),
            "created object pool"
        );

        Self {
            inner: Arc::new(PoolInner {
                factory,
                storage,
                reclaimer,
            }),
        }
    }

    /// Get an idle object, or build a new one
    ///
    /// `ctx` is passed to the factory only; taking an idle object never
    /// waits. A factory error is returned unchanged and leaves the pool
    /// untouched.
    pub async fn get(&self, ctx: &Context) -> Result<T, F::Error> {
        if let Some(value) = self.inner.storage.take() {
            return Ok(value);
        }

        let metrics = &self.inner.storage.metrics;
        match self.inner.factory.create(ctx).await {
            Ok(value) => {
                metrics.created.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("constructed new object");
                Ok(value)
            }
            Err(err) => {
                metrics.construction_failures.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("object construction failed");
                Err(err)
            }
        }
    }

    /// Like [`get`](Self::get), but wraps the object in a guard that puts
    /// it back when dropped
    pub async fn get_object(&self, ctx: &Context) -> Result<PooledObject<T>, F::Error> {
        let value = self.get(ctx).await?;
        Ok(PooledObject::new(value, Arc::clone(&self.inner.storage)))
    }

    /// Return an object for reuse
    ///
    /// Never fails and never blocks on availability. When the pool is
    /// full the object is evicted immediately.
    pub fn put(&self, item: T) {
        self.inner.storage.put(item);
    }

    /// Run a collector pass now
    ///
    /// Evicts every idle object that has outlived the max age, and every
    /// other idle object idle for at least `min_idle`. `Duration::ZERO`
    /// reclaims all idle objects. Returns the number evicted.
    pub fn reclaim(&self, min_idle: Duration) -> usize {
        self.inner.storage.reclaim(min_idle)
    }

    /// Evict every idle object; the pool stays usable. Returns the number evicted.
    pub fn drain(&self) -> usize {
        self.inner.storage.drain()
    }

    /// Get idle count
    pub fn idle_count(&self) -> usize {
        self.inner.storage.idle_count()
    }

    /// Idle capacity, `0` when unbounded
    pub fn capacity(&self) -> usize {
        self.inner.storage.capacity()
    }

    /// The max age in force, if any
    pub fn max_age(&self) -> Option<Duration> {
        self.inner.storage.max_age()
    }

    /// Get pool metrics
    pub fn get_metrics(&self) -> PoolMetrics {
        self.inner.storage.get_metrics()
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.get_metrics().export()
    }

    /// Export metrics in Prometheus format
    #[cfg(feature = "metrics")]
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> prometheus::Result<String> {
        MetricsExporter::export_prometheus(&self.get_metrics(), pool_name, tags)
    }
}
