use hypercast::{HypercastConfig, HypercubeClient, RoundRecorder};
use std::sync::Arc;
use std::time::Duration;

/// Helper: run a collective operation across N clients concurrently.
/// Keeps all clients alive until every task completes.
pub async fn run_collective<F, Fut>(world_size: u32, f: F)
where
    F: Fn(Arc<HypercubeClient>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    run_collective_with_config(world_size, HypercastConfig::default(), f).await;
}

pub async fn run_collective_with_config<F, Fut>(world_size: u32, config: HypercastConfig, f: F)
where
    F: Fn(Arc<HypercubeClient>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let clients = HypercubeClient::bootstrap_local_with_config(world_size, config);
    run_clients(clients.into_iter().map(Arc::new).collect(), f).await;
}

/// Like [`run_collective`], with a fresh [`RoundRecorder`] attached to every
/// rank. Returns the recorders indexed by rank.
pub async fn run_recorded<F, Fut>(world_size: u32, f: F) -> Vec<Arc<RoundRecorder>>
where
    F: Fn(Arc<HypercubeClient>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let recorders: Vec<Arc<RoundRecorder>> = (0..world_size)
        .map(|_| Arc::new(RoundRecorder::new()))
        .collect();
    let clients = HypercubeClient::bootstrap_local(world_size)
        .into_iter()
        .zip(&recorders)
        .map(|(c, r)| Arc::new(c.with_observer(r.clone())))
        .collect();
    run_clients(clients, f).await;
    recorders
}

pub async fn run_clients<F, Fut>(clients: Vec<Arc<HypercubeClient>>, f: F)
where
    F: Fn(Arc<HypercubeClient>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let f = Arc::new(f);
    let mut handles = Vec::new();
    for c in &clients {
        let c = Arc::clone(c);
        let f = Arc::clone(&f);
        handles.push(tokio::spawn(async move { f(c).await }));
    }
    for h in handles {
        h.await.unwrap();
    }
}

/// Short timeouts so failure tests finish quickly.
pub fn fast_config() -> HypercastConfig {
    HypercastConfig {
        collective_timeout: Duration::from_millis(300),
        barrier_timeout: Duration::from_millis(300),
        ..HypercastConfig::default()
    }
}

/// Block `p` of rank `rank`'s personalized send buffer in run `run`.
pub fn personalized_value(rank: u32, dest: u32, world: u32, run: i64) -> i64 {
    let factor = if rank & 1 == 1 { -1 } else { 1 };
    let r = rank as i64;
    r * world as i64 + dest as i64 + run * r * r * factor
}

pub fn personalized_send(rank: u32, world: u32, size: usize, run: i64) -> Vec<i64> {
    (0..world)
        .flat_map(|p| std::iter::repeat_n(personalized_value(rank, p, world, run), size))
        .collect()
}

/// What `rank` should hold after a personalized exchange in run `run`.
pub fn personalized_expected(rank: u32, world: u32, size: usize, run: i64) -> Vec<i64> {
    (0..world)
        .flat_map(|p| std::iter::repeat_n(personalized_value(p, rank, world, run), size))
        .collect()
}
