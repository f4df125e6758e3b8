//! Reclamation of idle objects and cancellable construction

use async_trait::async_trait;
use recycle_pool::{Context, ContextError, Factory, Pool, PoolConfiguration};
use std::time::Duration;

struct Socket {
    port: u16,
}

/// Pretends to dial a remote host, honouring the caller's context.
struct Dialer {
    latency: Duration,
}

#[async_trait]
impl Factory<Socket> for Dialer {
    type Error = ContextError;

    async fn create(&self, ctx: &Context) -> Result<Socket, ContextError> {
        tokio::select! {
            _ = tokio::time::sleep(self.latency) => Ok(Socket { port: 8080 }),
            err = ctx.done() => Err(err),
        }
    }
}

#[tokio::main]
async fn main() {
    println!("=== recycle_pool - Reclamation ===\n");

    let config = PoolConfiguration::new()
        .with_reclaim_interval(Duration::from_millis(100))
        .with_evict(|socket: Socket| println!("   [evict] closing socket on port {}", socket.port));
    let pool = Pool::new(
        Dialer {
            latency: Duration::from_millis(20),
        },
        config,
    );

    println!("1. Background reclaimer:");
    let socket = pool.get(&Context::background()).await.unwrap();
    pool.put(socket);
    println!("   Idle: {}", pool.idle_count());
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("   Idle after reclaimer ran: {}\n", pool.idle_count());

    println!("2. Forced collector pass:");
    let socket = pool.get(&Context::background()).await.unwrap();
    pool.put(socket);
    println!("   Reclaimed: {}\n", pool.reclaim(Duration::ZERO));

    println!("3. Construction deadline:");
    let ctx = Context::with_timeout(Duration::from_millis(5));
    match pool.get(&ctx).await {
        Ok(socket) => println!("   Connected on port {}", socket.port),
        Err(err) => println!("   Construction failed: {err}"),
    }
}
