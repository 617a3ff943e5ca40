use bounded_pool::{BoundedPool, PoolConfiguration};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tokio_util::sync::CancellationToken;

fn bench_try_borrow(c: &mut Criterion) {
    let pool = BoundedPool::new(PoolConfiguration::new().with_size(64).with_bootstrap(64), || {
        vec![0u8; 4096]
    });

    c.bench_function("try_borrow_return", |b| {
        b.iter(|| {
            let lease = pool.try_borrow().unwrap();
            black_box(lease.len());
            pool.return_item(lease);
        })
    });
}

fn bench_unbounded(c: &mut Criterion) {
    let pool = BoundedPool::new(PoolConfiguration::default(), || vec![0u8; 4096]);

    c.bench_function("unbounded_borrow_return", |b| {
        b.iter(|| {
            let lease = pool.try_borrow().unwrap();
            pool.return_item(black_box(lease));
        })
    });
}

fn bench_async_borrow(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let pool = BoundedPool::new(PoolConfiguration::new().with_size(8), || vec![0u8; 4096]);
    let cancel = CancellationToken::new();

    c.bench_function("async_borrow_return", |b| {
        b.to_async(&runtime).iter(|| async {
            let lease = pool.borrow(&cancel).await.unwrap();
            pool.return_item(lease);
        })
    });
}

criterion_group!(benches, bench_try_borrow, bench_unbounded, bench_async_borrow);
criterion_main!(benches);
