//! Metrics collection and export for bounded pools

use crossbeam::utils::CachePadded;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Point-in-time metrics for a pool
///
/// # Examples
///
/// ```
/// use bounded_pool::{BoundedPool, PoolConfiguration};
///
/// let pool = BoundedPool::new(PoolConfiguration::new().with_size(4), || vec![0u8; 64]);
///
/// let lease = pool.try_borrow().unwrap();
/// let metrics = pool.metrics();
/// assert_eq!(metrics.total_borrowed, 1);
/// assert_eq!(metrics.outstanding, 1);
/// assert_eq!(metrics.live_items, 1);
/// pool.return_item(lease);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "metrics", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Items created by the factory and not yet retired
    pub live_items: usize,

    /// Items currently parked in the idle cache
    pub idle_items: usize,

    /// Borrowed items not yet returned (bounded pools only)
    pub outstanding: usize,

    /// Effective maximum (0 when unbounded)
    pub max_size: usize,

    /// Total items produced by the factory
    pub total_created: usize,

    /// Total successful borrows
    pub total_borrowed: usize,

    /// Total returns
    pub total_returned: usize,

    /// Total items dropped out of pool accounting
    pub total_retired: usize,

    /// Borrows abandoned by cancellation or timeout
    pub cancelled_borrows: usize,

    /// Admission gate utilization ratio (0.0 to 1.0)
    pub utilization: f64,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("live_items".to_string(), self.live_items.to_string());
        metrics.insert("idle_items".to_string(), self.idle_items.to_string());
        metrics.insert("outstanding".to_string(), self.outstanding.to_string());
        metrics.insert("max_size".to_string(), self.max_size.to_string());
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("total_borrowed".to_string(), self.total_borrowed.to_string());
        metrics.insert("total_returned".to_string(), self.total_returned.to_string());
        metrics.insert("total_retired".to_string(), self.total_retired.to_string());
        metrics.insert("cancelled_borrows".to_string(), self.cancelled_borrows.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics
    }
}

/// Metrics exporter for Prometheus text format
#[cfg(feature = "metrics")]
pub struct MetricsExporter;

#[cfg(feature = "metrics")]
impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use bounded_pool::{BoundedPool, MetricsExporter, PoolConfiguration};
    /// use std::collections::HashMap;
    ///
    /// let pool = BoundedPool::new(PoolConfiguration::new().with_bootstrap(2), || 0u64);
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = MetricsExporter::export_prometheus(&pool.metrics(), "workers", Some(&tags)).unwrap();
    /// assert!(output.contains("boundedpool_items_live"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> Result<String, prometheus::Error> {
        use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};

        let registry = Registry::new();
        let labels = Self::labels(pool_name, tags);
        let opts = |name: &str, help: &str| Opts::new(name, help).const_labels(labels.clone());

        let gauges = [
            ("boundedpool_items_live", "Items created and not yet retired", metrics.live_items),
            ("boundedpool_items_idle", "Items parked in the idle cache", metrics.idle_items),
            ("boundedpool_items_outstanding", "Borrowed items not yet returned", metrics.outstanding),
            ("boundedpool_max_size", "Maximum concurrently borrowed items", metrics.max_size),
        ];
        for (name, help, value) in gauges {
            let gauge = IntGauge::with_opts(opts(name, help))?;
            gauge.set(value as i64);
            registry.register(Box::new(gauge))?;
        }

        let counters = [
            ("boundedpool_items_created_total", "Items produced by the factory", metrics.total_created),
            ("boundedpool_borrows_total", "Successful borrows", metrics.total_borrowed),
            ("boundedpool_returns_total", "Items returned to the pool", metrics.total_returned),
            ("boundedpool_items_retired_total", "Items dropped out of the pool", metrics.total_retired),
            ("boundedpool_borrows_cancelled_total", "Borrows abandoned while waiting", metrics.cancelled_borrows),
        ];
        for (name, help, value) in counters {
            let counter = IntCounter::with_opts(opts(name, help))?;
            counter.inc_by(value as u64);
            registry.register(Box::new(counter))?;
        }

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    fn labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        labels.insert("pool".to_string(), pool_name.to_string());

        if let Some(tags) = tags {
            for (key, value) in tags {
                labels.insert(key.clone(), value.clone());
            }
        }

        labels
    }
}

/// Internal metrics tracker, shared with every retirement token
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub live: CachePadded<AtomicUsize>,
    pub created: CachePadded<AtomicUsize>,
    pub borrowed: CachePadded<AtomicUsize>,
    pub returned: CachePadded<AtomicUsize>,
    pub retired: CachePadded<AtomicUsize>,
    pub cancelled: CachePadded<AtomicUsize>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
        self.live.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_retired(&self) {
        self.retired.fetch_add(1, Ordering::Relaxed);
        self.live.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    pub fn get_metrics(&self, idle: usize, outstanding: usize, max_size: usize) -> PoolMetrics {
        let utilization = if max_size > 0 {
            outstanding as f64 / max_size as f64
        } else {
            0.0
        };

        PoolMetrics {
            live_items: self.live(),
            idle_items: idle,
            outstanding,
            max_size,
            total_created: self.created.load(Ordering::Relaxed),
            total_borrowed: self.borrowed.load(Ordering::Relaxed),
            total_returned: self.returned.load(Ordering::Relaxed),
            total_retired: self.retired.load(Ordering::Relaxed),
            cancelled_borrows: self.cancelled.load(Ordering::Relaxed),
            utilization,
        }
    }
}
