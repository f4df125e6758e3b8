//! Background reclamation of idle objects
//!
//! There is no garbage collector to notice that an idle object has gone
//! unused, so a dedicated thread periodically runs a collector pass over
//! the pool's storage instead. It only ever sees objects that sit in
//! storage at that moment; checked-out objects are out of its reach.

use crate::storage::Storage;

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Handle to a running reclaimer thread. Dropping it stops the thread.
pub(crate) struct Reclaimer {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Reclaimer {
    pub fn spawn<T>(storage: Arc<Storage<T>>, interval: Duration, grace: Duration) -> std::io::Result<Self>
    where
        T: Send + 'static,
    {
        let (shutdown, signal) = channel::bounded::<()>(0);

        let handle = thread::Builder::new()
            .name("objectpool-reclaimer".to_string())
            .spawn(move || {
                tracing::debug!(?interval, ?grace, "reclaimer started");
                loop {
                    match signal.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let reclaimed = storage.reclaim(grace);
                            if reclaimed > 0 {
                                tracing::trace!(reclaimed, "reclaimer pass");
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::debug!("reclaimer stopped");
            })?;

        Ok(Self {
            shutdown: Some(shutdown),
            handle: Some(handle),
        })
    }
}

impl Drop for Reclaimer {
    fn drop(&mut self) {
        // Disconnecting the channel wakes the thread immediately.
        drop(self.shutdown.take());

        if let Some(handle) = self.handle.take() {
            // An eviction callback running on the reclaimer may drop the last pool handle.
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                tracing::warn!("reclaimer thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfiguration;
    use std::time::Instant;

    #[test]
    fn test_reclaims_idle_objects() {
        let (tx, rx) = channel::unbounded();
        let config = PoolConfiguration::new().with_evict(move |item: u32| {
            let _ = tx.send(item);
        });
        let storage = Arc::new(Storage::new(&config));
        storage.put(9);

        let _reclaimer =
            Reclaimer::spawn(Arc::clone(&storage), Duration::from_millis(5), Duration::ZERO).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(3)), Ok(9));
        assert_eq!(storage.idle_count(), 0);
    }

    #[test]
    fn test_drop_stops_promptly() {
        let storage = Arc::new(Storage::<u32>::new(&PoolConfiguration::new()));
        let reclaimer =
            Reclaimer::spawn(Arc::clone(&storage), Duration::from_secs(3600), Duration::ZERO).unwrap();

        let started = Instant::now();
        drop(reclaimer);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(Arc::strong_count(&storage), 1);
    }
}
