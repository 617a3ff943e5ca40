// Small demo binary: several tasks share a pool of three workers.
// Run with: RUST_LOG=bounded_pool=trace cargo run

use bounded_pool::{BoundedPool, PoolConfiguration};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Worker {
    id: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let next_id = AtomicUsize::new(0);
    let pool = Arc::new(BoundedPool::new(
        PoolConfiguration::new().with_size(3).with_bootstrap(2),
        move || Worker {
            id: next_id.fetch_add(1, Ordering::Relaxed),
        },
    ));
    info!(live = pool.count(), max_size = pool.max_size(), "pool ready");

    let cancel = CancellationToken::new();
    let mut handles = Vec::new();
    for job in 0..8 {
        let pool = Arc::clone(&pool);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            match pool.borrow(&cancel).await {
                Ok(worker) => {
                    info!(job, worker = worker.id, "job running");
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    pool.return_item(worker);
                }
                Err(e) => warn!(job, error = %e, "job skipped"),
            }
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "job panicked");
        }
    }

    let metrics = pool.metrics();
    info!(
        live = metrics.live_items,
        idle = metrics.idle_items,
        borrowed = metrics.total_borrowed,
        "all jobs finished"
    );
}
