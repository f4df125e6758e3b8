//! Basic usage examples for Pool

use recycle_pool::{Context, Pool, PoolConfiguration};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug)]
struct Connection {
    id: usize,
}

#[tokio::main]
async fn main() {
    println!("=== recycle_pool - Basic Examples ===\n");

    // Example 1: Get, put, reuse
    simple_pool().await;

    // Example 2: Capacity and eviction callback
    bounded_pool().await;

    // Example 3: Max age
    aging_pool().await;

    // Example 4: Metrics
    metrics().await;
}

fn connections() -> impl Fn(&Context) -> Result<Connection, Infallible> + Send + Sync + 'static {
    let next = AtomicUsize::new(1);
    move |_: &Context| {
        let id = next.fetch_add(1, Ordering::Relaxed);
        println!("   [factory] opening connection {id}");
        Ok(Connection { id })
    }
}

async fn simple_pool() {
    println!("1. Simple Pool:");
    let pool = Pool::new(connections(), PoolConfiguration::new());
    let ctx = Context::background();

    let conn = pool.get(&ctx).await.unwrap();
    println!("   Got connection {}", conn.id);
    pool.put(conn);

    {
        let conn = pool.get_object(&ctx).await.unwrap();
        println!("   Reused connection {}", conn.id);
        // Connection automatically returned when dropped
    }

    println!("   Idle after return: {}\n", pool.idle_count());
}

async fn bounded_pool() {
    println!("2. Bounded Pool:");
    let config = PoolConfiguration::new()
        .with_capacity(2)
        .with_evict(|conn: Connection| println!("   [evict] closing connection {}", conn.id));
    let pool = Pool::new(connections(), config);
    let ctx = Context::background();

    let mut held = Vec::new();
    for _ in 0..3 {
        held.push(pool.get(&ctx).await.unwrap());
    }
    for conn in held {
        pool.put(conn);
    }

    println!("   Idle: {} of {}\n", pool.idle_count(), pool.capacity());
}

async fn aging_pool() {
    println!("3. Max Age:");
    let config = PoolConfiguration::new()
        .with_max_age(Duration::from_millis(50))
        .with_evict(|conn: Connection| println!("   [evict] connection {} went stale", conn.id));
    let pool = Pool::new(connections(), config);
    let ctx = Context::background();

    let conn = pool.get(&ctx).await.unwrap();
    pool.put(conn);
    tokio::time::sleep(Duration::from_millis(80)).await;

    let conn = pool.get(&ctx).await.unwrap();
    println!("   Got fresh connection {}\n", conn.id);
}

async fn metrics() {
    println!("4. Metrics:");
    let pool = Pool::new(connections(), PoolConfiguration::new().with_capacity(1));
    let ctx = Context::background();

    for _ in 0..3 {
        let a = pool.get(&ctx).await.unwrap();
        let b = pool.get(&ctx).await.unwrap();
        pool.put(a);
        pool.put(b);
    }

    let mut exported: Vec<_> = pool.export_metrics().into_iter().collect();
    exported.sort();
    for (key, value) in exported {
        println!("   {key}: {value}");
    }
}
