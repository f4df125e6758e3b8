//! # recycle_pool
//!
//! Generic, thread-safe object pool that recycles expensive objects
//! (connections, buffers, workers) across callers.
//!
//! ## Features
//!
//! - Objects are built on demand by a caller-supplied [`Factory`]
//! - Oldest-first reuse of idle objects
//! - Optional bound on the number of idle objects
//! - Max-age expiry of objects left idle for too long
//! - Eviction callback fired exactly once per discarded object
//! - Background reclamation of idle objects, plus on-demand collector passes
//! - Automatic return of objects via RAII (Drop trait)
//! - Cancellation and deadlines forwarded to the factory through [`Context`]
//! - Metrics with Prometheus export
//!
//! ## Quick Start
//!
//! ```rust
//! use recycle_pool::{Context, Pool, PoolConfiguration};
//! use std::convert::Infallible;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pool = Pool::new(
//!     |_: &Context| Ok::<_, Infallible>(Vec::<u8>::with_capacity(4096)),
//!     PoolConfiguration::new().with_capacity(8),
//! );
//! let ctx = Context::background();
//!
//! let buffer = pool.get(&ctx).await.unwrap();
//! pool.put(buffer);
//! assert_eq!(pool.idle_count(), 1);
//!
//! {
//!     let buffer = pool.get_object(&ctx).await.unwrap();
//!     assert!(buffer.capacity() >= 4096);
//!     // Buffer automatically returned when `buffer` goes out of scope
//! }
//! assert_eq!(pool.idle_count(), 1);
//! # }
//! ```

mod pool;
mod config;
mod context;
mod factory;
mod metrics;
mod eviction;
mod reclaimer;
mod storage;
mod errors;

pub use pool::{Pool, PooledObject};
pub use config::PoolConfiguration;
pub use context::Context;
pub use factory::Factory;
pub use metrics::PoolMetrics;
#[cfg(feature = "metrics")]
pub use metrics::MetricsExporter;
pub use eviction::{EvictCallback, EvictionReason};
pub use errors::{ContextError, ContextResult};
