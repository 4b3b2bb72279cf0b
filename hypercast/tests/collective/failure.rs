//! Collectives must fail with an error, never hang or return wrong data,
//! when ranks disagree or a peer goes away.

use super::helpers::fast_config;
use futures::future::BoxFuture;
use hypercast::{HypercastConfig, HypercastError, HypercubeClient, LocalTransport, Rank, Transport};
use std::sync::Arc;

/// Wraps an endpoint but reports a different world size.
struct ClaimedWorld {
    inner: LocalTransport,
    world_size: u32,
}

impl Transport for ClaimedWorld {
    fn rank(&self) -> Rank {
        self.inner.rank()
    }

    fn world_size(&self) -> u32 {
        self.world_size
    }

    fn send_tagged<'a>(
        &'a self,
        dest: Rank,
        tag: u64,
        data: &'a [u8],
    ) -> BoxFuture<'a, hypercast::Result<()>> {
        self.inner.send_tagged(dest, tag, data)
    }

    fn recv_tagged<'a>(
        &'a self,
        src: Rank,
        tag: u64,
    ) -> BoxFuture<'a, hypercast::Result<Vec<u8>>> {
        self.inner.recv_tagged(src, tag)
    }
}

#[tokio::test]
async fn test_size_mismatch_between_partners_is_error() {
    let clients: Vec<Arc<HypercubeClient>> =
        HypercubeClient::bootstrap_local_with_config(2, fast_config())
            .into_iter()
            .map(Arc::new)
            .collect();

    let mut handles = Vec::new();
    for c in &clients {
        let c = Arc::clone(c);
        handles.push(tokio::spawn(async move {
            let size = c.rank() as usize + 1;
            let send = vec![1u32; size];
            c.all_to_all_broadcast(&send, size).await
        }));
    }
    for h in handles {
        let err = h.await.unwrap().unwrap_err();
        assert!(
            matches!(err, HypercastError::BufferSizeMismatch { .. }),
            "unexpected error: {err}"
        );
    }
}

#[tokio::test]
async fn test_mismatched_world_size_is_topology_error() {
    let mut transports = LocalTransport::mesh(4).into_iter();
    let (Some(t0), Some(t1)) = (transports.next(), transports.next()) else {
        panic!("mesh too small");
    };
    let _idle: Vec<LocalTransport> = transports.collect();

    let liar = Arc::new(HypercubeClient::with_config(
        ClaimedWorld {
            inner: t0,
            world_size: 2,
        },
        fast_config(),
    ));
    let honest = Arc::new(HypercubeClient::with_config(t1, fast_config()));

    let a = {
        let c = Arc::clone(&liar);
        tokio::spawn(async move { c.all_to_all_broadcast(&[1u8], 1).await })
    };
    let b = {
        let c = Arc::clone(&honest);
        tokio::spawn(async move { c.all_to_all_broadcast(&[2u8], 1).await })
    };

    for result in [a.await.unwrap(), b.await.unwrap()] {
        let err = result.unwrap_err();
        assert!(err.is_topology_invariant(), "unexpected error: {err}");
    }
}

#[tokio::test]
async fn test_dropped_peer_fails_collective() {
    let mut clients = HypercubeClient::bootstrap_local_with_config(2, fast_config());
    drop(clients.pop());
    let err = clients[0]
        .all_to_all_broadcast(&[0u64], 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HypercastError::CollectiveFailed { rank: 1, .. }
    ));
}

// Paused clock: the runtime jumps to the deadline once every task is idle.
#[tokio::test(start_paused = true)]
async fn test_absent_peer_times_out() {
    let clients = HypercubeClient::bootstrap_local(2);
    let started = tokio::time::Instant::now();
    let err = clients[0]
        .all_to_all_personalized(&[0u64, 1], 1)
        .await
        .unwrap_err();
    match err {
        HypercastError::CollectiveFailed { reason, .. } => {
            assert!(reason.contains("timed out after 30000ms"), "{reason}")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(started.elapsed() >= HypercastConfig::default().collective_timeout);
}

#[tokio::test(start_paused = true)]
async fn test_barrier_times_out_without_peers() {
    let clients = HypercubeClient::bootstrap_local_with_config(3, fast_config());
    let err = clients[1].barrier().await.unwrap_err();
    assert!(matches!(err, HypercastError::CollectiveFailed { .. }));
}

#[tokio::test]
async fn test_payload_limit_rejects_before_sending() {
    let cfg = HypercastConfig {
        max_link_payload_bytes: 64,
        ..fast_config()
    };
    let clients = HypercubeClient::bootstrap_local_with_config(2, cfg);
    // Last round carries 1 * 16 * 8 = 128 bytes.
    let err = clients[0]
        .all_to_all_broadcast(&[0u64; 16], 16)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HypercastError::PayloadTooLarge {
            bytes: 128,
            limit: 64,
            ..
        }
    ));
    assert!(err.is_configuration());

    // Within the limit: both ranks still work afterwards.
    let clients: Vec<Arc<HypercubeClient>> = clients.into_iter().map(Arc::new).collect();
    let mut handles = Vec::new();
    for c in &clients {
        let c = Arc::clone(c);
        handles.push(tokio::spawn(async move {
            c.all_to_all_broadcast(&[c.rank() as u64], 1).await.unwrap()
        }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap(), vec![0, 1]);
    }
}
