//! Timing harness for the hypercube collectives.
//!
//! Runs an in-process world and, for message sizes 1, 16, ..., 65536
//! elements, times `runs` back-to-back calls of each collective. Every
//! result is checked. The slowest rank's time, collected with `reduce_max`,
//! is reported per call.
//!
//! ```bash
//! cargo run --release --example bench -- [world_size] [runs]
//! ```
//!
//! The personalized exchange is skipped for world sizes that are not a power
//! of two.

use hypercast::{HypercastConfig, HypercastError, HypercubeClient, PersonalizedStrategy, topology};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound on the whole run.
const WATCHDOG: Duration = Duration::from_secs(600);

/// Message sizes, in elements per block: 2^0, 2^4, ..., 2^16.
fn message_sizes() -> impl Iterator<Item = usize> {
    (0..=16).step_by(4).map(|l| 1usize << l)
}

#[derive(Debug, Clone, Copy)]
enum Workload {
    Broadcast,
    Personalized(PersonalizedStrategy),
}

impl std::fmt::Display for Workload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Workload::Broadcast => write!(f, "all-to-all broadcast"),
            Workload::Personalized(s) => write!(f, "all-to-all personalized ({s})"),
        }
    }
}

#[tokio::main]
async fn main() -> hypercast::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let world_size: u32 = parse_arg(args.next(), "world_size", 4)?;
    let runs: u32 = parse_arg(args.next(), "runs", (8000 / world_size).max(1))?;
    let config = HypercastConfig::from_env();

    match tokio::time::timeout(WATCHDOG, run(world_size, runs, config)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(timeout = ?WATCHDOG, "benchmark exceeded watchdog timeout");
            std::process::exit(2);
        }
    }
}

fn parse_arg(arg: Option<String>, key: &'static str, default: u32) -> hypercast::Result<u32> {
    match arg {
        None => Ok(default),
        Some(value) => match value.parse() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(HypercastError::InvalidConfig { key, value }),
        },
    }
}

async fn run(world_size: u32, runs: u32, config: HypercastConfig) -> hypercast::Result<()> {
    let clients: Vec<Arc<HypercubeClient>> =
        HypercubeClient::bootstrap_local_with_config(world_size, config)
            .into_iter()
            .map(Arc::new)
            .collect();
    println!("Starting {world_size} ranks, {runs} runs per size.");

    let mut workloads = vec![Workload::Broadcast];
    if topology::is_power_of_two(world_size) {
        workloads.push(Workload::Personalized(PersonalizedStrategy::Direct));
        workloads.push(Workload::Personalized(PersonalizedStrategy::Mesh));
    } else {
        tracing::warn!(
            world_size,
            "cannot run all-to-all personalized on a world that is not a power of two"
        );
    }

    let mut failures = 0u64;
    for workload in workloads {
        for msize in message_sizes() {
            let mut handles = Vec::new();
            for client in &clients {
                let c = Arc::clone(client);
                handles.push(tokio::spawn(async move {
                    time_rank(&c, workload, msize, runs).await
                }));
            }
            for h in handles {
                let (bad, max_time) = h
                    .await
                    .map_err(|e| HypercastError::transport(format!("rank task: {e}")))??;
                failures += bad;
                if let Some(max_time) = max_time {
                    println!(
                        "{workload} for m={msize} required {:.3e} seconds.",
                        max_time / f64::from(runs)
                    );
                }
            }
        }
    }

    if failures > 0 {
        tracing::error!(failures, "verification failed");
        std::process::exit(1);
    }
    Ok(())
}

/// One rank's share of a timed batch. Returns the number of wrong blocks
/// seen and, on rank 0, the slowest rank's elapsed seconds.
async fn time_rank(
    client: &HypercubeClient,
    workload: Workload,
    msize: usize,
    runs: u32,
) -> hypercast::Result<(u64, Option<f64>)> {
    let n = client.world_size() as i64;
    let me = client.rank() as i64;
    let mut bad = 0u64;

    client.barrier().await?;
    let start = Instant::now();
    for i in 0..runs as i64 {
        match workload {
            Workload::Broadcast => {
                let send = vec![(me + i * n) as i32; msize];
                let recv = client.all_to_all_broadcast(&send, msize).await?;
                for p in 0..n {
                    let got = recv[p as usize * msize];
                    let want = (p + i * n) as i32;
                    if got != want {
                        tracing::error!(rank = me, block = p, got, want, "broadcast mismatch");
                        bad += 1;
                    }
                }
            }
            Workload::Personalized(strategy) => {
                let send: Vec<i32> = (0..n)
                    .flat_map(|p| std::iter::repeat_n(personalized_value(me, p, n, i), msize))
                    .collect();
                let recv = client
                    .all_to_all_personalized_with(&send, msize, strategy)
                    .await?;
                for p in 0..n {
                    let got = recv[p as usize * msize];
                    let want = personalized_value(p, me, n, i);
                    if got != want {
                        tracing::error!(rank = me, block = p, got, want, "personalized mismatch");
                        bad += 1;
                    }
                }
            }
        }
    }
    let elapsed = start.elapsed().as_secs_f64();
    let max_time = client.reduce_max(elapsed).await?;
    Ok((bad, max_time))
}

/// Value `from` addresses to `to` in run `i`; odd senders vary negatively.
fn personalized_value(from: i64, to: i64, n: i64, i: i64) -> i32 {
    let factor = if from & 1 == 1 { -1 } else { 1 };
    (from * n + to + i * from * from * factor) as i32
}
