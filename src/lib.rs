//! # bounded_pool
//!
//! Thread-safe object pool that caches reusable instances of `T`, caps the
//! number of concurrently borrowed instances, and makes borrowers wait for a
//! free slot once that cap is reached.
//!
//! ## Features
//!
//! - Admission control through a counting semaphore (unbounded when size is 0)
//! - LIFO idle cache so a just-returned item is handed out next
//! - Lazy creation through a strongly-typed factory
//! - Pool warm-up (bootstrap) at construction
//! - Cancellable, timed and non-blocking borrows
//! - Live-count tracking of created-but-not-retired items
//! - Metrics snapshot with Prometheus export
//!
//! ## Quick Start
//!
//! ```rust
//! use bounded_pool::{BoundedPool, PoolConfiguration};
//!
//! let pool = BoundedPool::new(
//!     PoolConfiguration::new().with_size(2).with_bootstrap(1),
//!     || Vec::<u8>::with_capacity(4096),
//! );
//! assert_eq!(pool.count(), 1);
//!
//! let buf = pool.try_borrow().unwrap();
//! println!("Got buffer with capacity {}", buf.capacity());
//! pool.return_item(buf);
//! ```

mod config;
mod errors;
mod metrics;
mod pool;

pub use config::{PoolConfiguration, PoolOption};
pub use errors::{PoolError, PoolResult};
#[cfg(feature = "metrics")]
pub use metrics::MetricsExporter;
pub use metrics::PoolMetrics;
pub use pool::{BoundedPool, Lease};
