use criterion::{black_box, criterion_group, criterion_main, Criterion};
use recycle_pool::{Context, Pool, PoolConfiguration};
use std::convert::Infallible;

fn get_put(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let pool = Pool::new(
        |_: &Context| Ok::<_, Infallible>(Vec::<u8>::with_capacity(4096)),
        PoolConfiguration::new().with_capacity(64),
    );
    let ctx = Context::background();

    c.bench_function("get_put_hot", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let buffer = pool.get(&ctx).await.unwrap();
                pool.put(black_box(buffer));
            })
        })
    });

    c.bench_function("put_overflow", |b| {
        let full = Pool::new(
            |_: &Context| Ok::<_, Infallible>(0u64),
            PoolConfiguration::new().with_capacity(1),
        );
        full.put(0);
        b.iter(|| full.put(black_box(1)))
    });
}

criterion_group!(benches, get_put);
criterion_main!(benches);
