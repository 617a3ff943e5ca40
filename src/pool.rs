//! Core bounded pool implementation

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::metrics::{MetricsTracker, PoolMetrics};

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

type Factory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Decrements the live count when the item it travels with is retired.
struct LiveToken {
    tracker: Arc<MetricsTracker>,
}

impl Drop for LiveToken {
    fn drop(&mut self) {
        self.tracker.record_retired();
    }
}

struct Idle<T> {
    value: T,
    token: LiveToken,
}

/// An item borrowed from a [`BoundedPool`].
///
/// The lease owns the item and, for bounded pools, one admission slot. Hand it
/// back with [`BoundedPool::return_item`] to make the item reusable. Dropping
/// a lease without returning it retires the item and frees its slot.
#[must_use = "dropping a lease retires the item instead of returning it"]
pub struct Lease<T> {
    value: T,
    token: LiveToken,
    permit: Option<OwnedSemaphorePermit>,
}

impl<T> Lease<T> {
    /// Detach the item from the pool.
    ///
    /// The item no longer counts as live and its slot is released.
    pub fn into_inner(self) -> T {
        let Lease { value, token, permit } = self;
        drop(token);
        drop(permit);
        value
    }

    /// Retire the item instead of returning it.
    pub fn discard(self) {
        trace!("discarding leased item");
        drop(self);
    }
}

impl<T> Deref for Lease<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> DerefMut for Lease<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Lease<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("value", &self.value)
            .field("admitted", &self.permit.is_some())
            .finish()
    }
}

/// Thread-safe object pool that caps the number of concurrently borrowed items
///
/// Items are created lazily by the factory and cached when returned. When the
/// pool is bounded, a borrow waits for a free slot once `max_size` items are
/// out. The pool is not `Clone`: share it by reference or through an `Arc` so
/// that the gate and cache are never duplicated.
///
/// # Examples
///
/// ```
/// use bounded_pool::{BoundedPool, PoolConfiguration};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let pool = BoundedPool::new(PoolConfiguration::new().with_size(2), || String::with_capacity(1024));
/// let cancel = CancellationToken::new();
///
/// let mut buf = pool.borrow(&cancel).await.unwrap();
/// buf.push_str("hello");
/// pool.return_item(buf);
///
/// assert_eq!(pool.count(), 1);
/// assert_eq!(pool.idle_count(), 1);
/// # }
/// ```
pub struct BoundedPool<T> {
    idle: Mutex<Vec<Idle<T>>>,
    gate: Option<Arc<Semaphore>>,
    factory: RwLock<Factory<T>>,
    metrics: Arc<MetricsTracker>,
    max_size: usize,
}

impl<T> BoundedPool<T> {
    /// Create a pool and warm it up with `config.bootstrap` items.
    ///
    /// `config.size` is promoted to `config.bootstrap` when smaller. A zero
    /// effective size makes the pool unbounded.
    ///
    /// # Panics
    ///
    /// Panics if the effective size exceeds [`Semaphore::MAX_PERMITS`].
    pub fn new<F>(config: PoolConfiguration, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let max_size = config.max_size();
        let gate = (max_size > 0).then(|| Arc::new(Semaphore::new(max_size)));

        debug!(max_size, bootstrap = config.bootstrap, "creating bounded pool");

        let pool = Self {
            idle: Mutex::new(Vec::with_capacity(config.bootstrap)),
            gate,
            factory: RwLock::new(Arc::new(factory)),
            metrics: Arc::new(MetricsTracker::new()),
            max_size,
        };
        pool.warm_up(config.bootstrap);
        pool
    }

    /// Create a pool from options applied in order.
    pub fn with_options<I, F>(options: I, factory: F) -> Self
    where
        I: IntoIterator<Item = crate::config::PoolOption>,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(PoolConfiguration::from_options(options), factory)
    }

    // Leaves the cache as if `count` items were borrowed and then returned in
    // reverse order: the first created item is on top.
    fn warm_up(&self, count: usize) {
        if count == 0 {
            return;
        }

        let mut items: Vec<Idle<T>> = (0..count)
            .map(|_| {
                let (value, token) = self.create();
                Idle { value, token }
            })
            .collect();
        items.reverse();
        self.idle.lock().extend(items);

        debug!(count, "pool warmed up");
    }

    /// Replace the factory used for future cache misses.
    ///
    /// Items already created are unaffected and the live count is kept.
    pub fn set_factory<F>(&self, factory: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        *self.factory.write() = Arc::new(factory);
        debug!("pool factory replaced");
    }

    /// Borrow an item, waiting for a free slot if the pool is saturated.
    ///
    /// Only the wait is interrupted by `cancel`: if a slot is free the borrow
    /// succeeds even when the token is already cancelled.
    ///
    /// # Errors
    ///
    /// [`PoolError::Cancelled`] if `cancel` fires while waiting,
    /// [`PoolError::Closed`] if the pool was closed.
    pub async fn borrow(&self, cancel: &CancellationToken) -> PoolResult<Lease<T>> {
        let permit = match &self.gate {
            Some(gate) => Some(self.admit(gate, cancel).await?),
            None => None,
        };
        Ok(self.checkout(permit))
    }

    /// Borrow an item, waiting at most `timeout` for a free slot.
    pub async fn borrow_timeout(&self, timeout: Duration) -> PoolResult<Lease<T>> {
        let permit = match &self.gate {
            Some(gate) => match tokio::time::timeout(timeout, gate.clone().acquire_owned()).await {
                Ok(Ok(permit)) => Some(permit),
                Ok(Err(_)) => return Err(PoolError::Closed),
                Err(_) => {
                    self.metrics.cancelled.fetch_add(1, Ordering::Relaxed);
                    debug!(?timeout, "borrow timed out waiting for admission");
                    return Err(PoolError::Timeout(timeout));
                }
            },
            None => None,
        };
        Ok(self.checkout(permit))
    }

    /// Borrow an item only if a slot is free right now.
    pub fn try_borrow(&self) -> PoolResult<Lease<T>> {
        let permit = match &self.gate {
            Some(gate) => match gate.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(TryAcquireError::NoPermits) => return Err(PoolError::Exhausted),
                Err(TryAcquireError::Closed) => return Err(PoolError::Closed),
            },
            None => None,
        };
        Ok(self.checkout(permit))
    }

    async fn admit(
        &self,
        gate: &Arc<Semaphore>,
        cancel: &CancellationToken,
    ) -> PoolResult<OwnedSemaphorePermit> {
        match gate.clone().try_acquire_owned() {
            Ok(permit) => return Ok(permit),
            Err(TryAcquireError::Closed) => return Err(PoolError::Closed),
            Err(TryAcquireError::NoPermits) => {}
        }

        trace!(max_size = self.max_size, "pool saturated, waiting for admission");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.metrics.cancelled.fetch_add(1, Ordering::Relaxed);
                debug!("borrow cancelled while waiting for admission");
                Err(PoolError::Cancelled)
            }
            permit = gate.clone().acquire_owned() => permit.map_err(|_| PoolError::Closed),
        }
    }

    fn checkout(&self, permit: Option<OwnedSemaphorePermit>) -> Lease<T> {
        let cached = self.idle.lock().pop();
        let reused = cached.is_some();
        let (value, token) = match cached {
            Some(Idle { value, token }) => (value, token),
            None => self.create(),
        };

        self.metrics.borrowed.fetch_add(1, Ordering::Relaxed);
        trace!(reused, "item borrowed");

        Lease { value, token, permit }
    }

    fn create(&self) -> (T, LiveToken) {
        let factory = self.factory.read().clone();
        let value = factory();
        self.metrics.record_created();
        trace!(live = self.metrics.live(), "item created");

        let token = LiveToken {
            tracker: Arc::clone(&self.metrics),
        };
        (value, token)
    }

    /// Put a borrowed item back into the idle cache and free its slot.
    pub fn return_item(&self, lease: Lease<T>) {
        let Lease { value, token, permit } = lease;
        self.idle.lock().push(Idle { value, token });
        self.metrics.returned.fetch_add(1, Ordering::Relaxed);
        drop(permit);
        trace!("item returned");
    }

    /// Number of items created by the factory and not yet retired.
    ///
    /// Counts idle and borrowed items alike. A lease that is held forever
    /// keeps counting, so treat this as an observability signal.
    pub fn count(&self) -> usize {
        self.metrics.live()
    }

    /// Close the admission gate.
    ///
    /// Waiting and future borrows on a bounded pool fail with
    /// [`PoolError::Closed`]. Returns are still accepted.
    pub fn close(&self) {
        if let Some(gate) = &self.gate {
            gate.close();
            debug!("pool closed");
        }
    }

    /// Whether [`close`](Self::close) was called on a bounded pool.
    pub fn is_closed(&self) -> bool {
        self.gate.as_ref().is_some_and(|gate| gate.is_closed())
    }

    /// Drop every idle item, returning how many were removed.
    pub fn clear_idle(&self) -> usize {
        let drained = std::mem::take(&mut *self.idle.lock());
        let removed = drained.len();
        drop(drained);

        if removed > 0 {
            debug!(removed, "idle cache cleared");
        }
        removed
    }

    /// Drop the least recently returned idle items until at most `keep` remain.
    pub fn shrink_idle(&self, keep: usize) -> usize {
        let drained: Vec<Idle<T>> = {
            let mut idle = self.idle.lock();
            let excess = idle.len().saturating_sub(keep);
            idle.drain(..excess).collect()
        };
        let removed = drained.len();
        drop(drained);

        if removed > 0 {
            debug!(removed, keep, "idle cache shrunk");
        }
        removed
    }

    /// Effective maximum number of concurrently borrowed items (0 = unbounded).
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn is_bounded(&self) -> bool {
        self.gate.is_some()
    }

    /// Items parked in the idle cache.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Slots currently held by borrowers. Always 0 for unbounded pools.
    pub fn outstanding(&self) -> usize {
        self.available_permits()
            .map_or(0, |available| self.max_size.saturating_sub(available))
    }

    /// Free slots, or `None` when unbounded.
    pub fn available_permits(&self) -> Option<usize> {
        self.gate.as_ref().map(|gate| gate.available_permits())
    }

    /// Get pool metrics
    pub fn metrics(&self) -> PoolMetrics {
        self.metrics
            .get_metrics(self.idle_count(), self.outstanding(), self.max_size)
    }
}

impl<T> fmt::Debug for BoundedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedPool")
            .field("max_size", &self.max_size)
            .field("idle", &self.idle_count())
            .field("live", &self.count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
