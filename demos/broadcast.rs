//! All-to-all broadcast across 3 ranks.
//!
//! Three is not a power of two, so rank 1 also plays virtual rank 3 of the
//! 4-corner hypercube. Every rank still ends with exactly three blocks.
//!
//! ```bash
//! RUST_LOG=hypercast=debug cargo run --example broadcast
//! ```

use hypercast::{HypercubeClient, TracingObserver};
use std::sync::Arc;

#[tokio::main]
async fn main() -> hypercast::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let world_size = 3u32;
    let clients: Vec<Arc<HypercubeClient>> = HypercubeClient::bootstrap_local(world_size)
        .into_iter()
        .map(|c| Arc::new(c.with_observer(Arc::new(TracingObserver))))
        .collect();

    // rank 0 sends [0, 0], rank 1 sends [10, 10], rank 2 sends [20, 20].
    let mut handles = Vec::new();
    for client in &clients {
        let c = Arc::clone(client);
        handles.push(tokio::spawn(async move {
            let rank = c.rank();
            let mine = [rank * 10; 2];
            let all = c.all_to_all_broadcast(&mine, 2).await?;
            hypercast::Result::Ok((rank, all))
        }));
    }

    for h in handles {
        let (rank, all) = h
            .await
            .map_err(|e| hypercast::HypercastError::transport(format!("rank task: {e}")))??;
        println!("rank {rank}: {all:?}");
    }
    // Output (all ranks identical):
    // rank 0: [0, 0, 10, 10, 20, 20]
    // rank 1: [0, 0, 10, 10, 20, 20]
    // rank 2: [0, 0, 10, 10, 20, 20]

    Ok(())
}
