use crate::client::HypercubeClient;
use crate::collective::helpers::{Endpoint, RoundCtx, framed_send_recv};
use crate::error::{HypercastError, Result};
use crate::topology::ceil_log2;
use crate::types::Operation;
use std::time::Duration;

const OP: Operation = Operation::Barrier;

/// Dissemination barrier: `ceil_log2(N)` rounds, round `k` signals
/// `rank + 2^k` and waits for `rank - 2^k` (mod N).
///
/// After the last round every rank has transitively heard from every other
/// rank, so no rank leaves before all have entered.
pub(crate) async fn barrier(client: &HypercubeClient, timeout: Duration) -> Result<()> {
    let world = client.world_size();
    let rank = client.rank();
    let rounds = ceil_log2(world);
    let epoch = client.next_epoch();
    client.observer().call_started(OP, rank, world, rounds);

    let run = async {
        for round in 0..rounds {
            let dist = 1u32 << round;
            let to = (rank + dist) % world;
            let from = (rank + world - dist % world) % world;
            let ctx = RoundCtx {
                epoch,
                operation: OP,
                world_size: world,
                round,
            };
            framed_send_recv(
                client,
                ctx,
                Endpoint::physical(rank),
                (Endpoint::physical(to), to),
                (Endpoint::physical(from), from),
                &[],
            )
            .await?;
        }
        Ok::<(), HypercastError>(())
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(HypercastError::CollectiveFailed {
                operation: OP.name(),
                rank,
                reason: format!("barrier timed out after {}ms", timeout.as_millis()),
            });
        }
    }

    client.observer().call_finished(OP, rank, rounds);
    Ok(())
}
