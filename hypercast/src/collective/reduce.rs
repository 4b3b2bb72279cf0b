use crate::client::HypercubeClient;
use crate::collective::helpers::{RoundCtx, collective_recv, collective_send};
use crate::element;
use crate::error::Result;
use crate::protocol::{FrameHeader, Lane};
use crate::topology::ceil_log2;
use crate::types::Operation;

const OP: Operation = Operation::ReduceMax;

/// Binomial-tree maximum to rank 0.
///
/// In round `k` every rank whose bit `k` is set sends its partial maximum
/// to `rank - 2^k` and drops out; the others fold in what they receive
/// from `rank + 2^k` when that rank exists. Returns `Some` on rank 0 only.
pub(crate) async fn reduce_max(client: &HypercubeClient, value: f64) -> Result<Option<f64>> {
    let world = client.world_size();
    let rank = client.rank();
    let rounds = ceil_log2(world);
    let epoch = client.next_epoch();
    client.observer().call_started(OP, rank, world, rounds);

    let mut acc = value;
    for round in 0..rounds {
        let ctx = RoundCtx {
            epoch,
            operation: OP,
            world_size: world,
            round,
        };
        let tag = ctx.tag(Lane::Physical);
        let mask = 1u32 << round;

        if rank & mask != 0 {
            let parent = rank ^ mask;
            let frame = ctx.header(rank, parent).frame(&element::encode(&[acc]));
            collective_send(client, OP, parent, tag, &frame).await?;
            client.observer().call_finished(OP, rank, round + 1);
            return Ok(None);
        }

        let child = rank | mask;
        if child < world {
            let received = collective_recv(client, OP, child, tag).await?;
            let (h, body) = FrameHeader::split(&received)?;
            h.verify(&ctx.header(child, rank))?;
            let theirs: Vec<f64> = element::decode(body, 1)?;
            acc = acc.max(theirs[0]);
        }
    }

    client.observer().call_finished(OP, rank, rounds);
    Ok(Some(acc))
}
