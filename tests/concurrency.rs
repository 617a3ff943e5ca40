//! Contract tests for the pool under concurrent borrowers.

use bounded_pool::{BoundedPool, PoolConfiguration, PoolError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct Conn {
    id: usize,
}

fn conn_pool(config: PoolConfiguration) -> Arc<BoundedPool<Conn>> {
    let next = AtomicUsize::new(0);
    Arc::new(BoundedPool::new(config, move || Conn {
        id: next.fetch_add(1, Ordering::SeqCst),
    }))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn outstanding_never_exceeds_max_size() {
    let pool = conn_pool(PoolConfiguration::new().with_size(3));
    let in_use = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let cancel = CancellationToken::new();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let pool = Arc::clone(&pool);
        let in_use = Arc::clone(&in_use);
        let peak = Arc::clone(&peak);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..10 {
                let lease = pool.borrow(&cancel).await.unwrap();
                let now = in_use.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                in_use.fetch_sub(1, Ordering::SeqCst);
                pool.return_item(lease);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert!(pool.count() <= 3);
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(pool.metrics().total_borrowed, 320);
    assert_eq!(pool.metrics().total_returned, 320);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn waiting_borrower_gets_returned_instance() {
    let pool = conn_pool(PoolConfiguration::new().with_size(1));
    let held = pool.try_borrow().unwrap();
    let held_id = held.id;

    let waiter = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            let lease = pool.borrow(&CancellationToken::new()).await.unwrap();
            let id = lease.id;
            pool.return_item(lease);
            id
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());
    pool.return_item(held);

    assert_eq!(waiter.await.unwrap(), held_id);
    assert_eq!(pool.count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelling_one_waiter_leaves_others_queued() {
    let pool = conn_pool(PoolConfiguration::new().with_size(1));
    let held = pool.try_borrow().unwrap();

    let doomed = CancellationToken::new();
    let cancelled = {
        let pool = Arc::clone(&pool);
        let doomed = doomed.clone();
        tokio::spawn(async move { pool.borrow(&doomed).await.map(|lease| lease.id) })
    };
    let patient = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            pool.borrow_timeout(Duration::from_secs(5))
                .await
                .map(|lease| lease.into_inner().id)
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    doomed.cancel();
    assert_eq!(cancelled.await.unwrap(), Err(PoolError::Cancelled));

    pool.return_item(held);
    assert_eq!(patient.await.unwrap(), Ok(0));
    assert_eq!(pool.available_permits(), Some(1));
}

#[test]
fn borrows_from_plain_threads() {
    let pool = conn_pool(PoolConfiguration::new().with_size(4).with_bootstrap(4));

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..100 {
                    match pool.try_borrow() {
                        Ok(lease) => pool.return_item(lease),
                        Err(e) => assert_eq!(e, PoolError::Exhausted),
                    }
                }
            });
        }
    });

    assert_eq!(pool.count(), 4);
    assert_eq!(pool.idle_count(), 4);
}
