use criterion::{criterion_group, criterion_main, Criterion};

use aop::Pool;

fn submit_and_collect(c: &mut Criterion) {
    let pool = Pool::new(4).expect("pool");

    c.bench_function("submit_collect_64", |b| {
        b.iter(|| {
            let futures: Vec<_> = (0..64u64)
                .map(|n| pool.submit_computation(move || n * 2))
                .collect();
            let total: u64 = futures.iter().map(|f| f.wait()).sum();
            assert_eq!(total, 4032);
        })
    });

    c.bench_function("chain_depth_16", |b| {
        b.iter(|| {
            let mut link = pool.submit_computation(|| 0u64);
            for _ in 0..16 {
                link = link.then(|&v| v + 1).expect("registration");
            }
            assert_eq!(link.wait(), 16);
        })
    });

    pool.shutdown();
}

criterion_group!(benches, submit_and_collect);
criterion_main!(benches);
