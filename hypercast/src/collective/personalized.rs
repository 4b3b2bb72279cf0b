use crate::client::HypercubeClient;
use crate::collective::helpers::{Endpoint, RoundCtx, check_payload, exchange_elements};
use crate::element::Element;
use crate::error::{HypercastError, Result};
use crate::memory::ExchangeBuffer;
use crate::observer::{RoundEvent, Route};
use crate::topology::{Participant, ceil_log2, is_power_of_two};
use crate::types::{Operation, PersonalizedStrategy, Rank};

const OP: Operation = Operation::AllToAllPersonalized;

/// All-to-all personalized exchange: segment `p` of `send` goes to rank
/// `p`; segment `p` of the result is what rank `p` addressed to this rank.
///
/// Only defined for power-of-two worlds; anything else is rejected before
/// a single frame is sent.
pub(crate) async fn all_to_all_personalized<T: Element>(
    client: &HypercubeClient,
    send: &[T],
    size: usize,
    strategy: PersonalizedStrategy,
) -> Result<Vec<T>> {
    let world = client.world_size();
    let rank = client.rank();

    if !is_power_of_two(world) {
        return Err(HypercastError::NonPowerOfTwoWorld {
            operation: OP.name(),
            world_size: world,
        });
    }
    if size == 0 {
        return Err(HypercastError::ZeroSize {
            operation: OP.name(),
        });
    }
    let Some(total) = (world as usize).checked_mul(size) else {
        return Err(HypercastError::PayloadTooLarge {
            operation: OP.name(),
            bytes: usize::MAX,
            limit: client.config().max_link_payload_bytes,
        });
    };
    if send.len() != total {
        return Err(HypercastError::InputLengthMismatch {
            operation: OP.name(),
            expected: total,
            actual: send.len(),
        });
    }
    check_payload(client, OP, total.checked_mul(T::WIDTH))?;

    let epoch = client.next_epoch();
    let rounds = strategy.rounds(world);
    client.observer().call_started(OP, rank, world, rounds);

    let mut buf = ExchangeBuffer::with_segments(send.to_vec(), size)?;
    match strategy {
        PersonalizedStrategy::Direct => direct(client, epoch, &mut buf).await?,
        PersonalizedStrategy::Mesh => mesh(client, epoch, &mut buf).await?,
    }

    client.observer().call_finished(OP, rank, rounds);
    Ok(buf.into_vec())
}

/// Pairwise exchange with `rank ^ i` for `i in 1..N`.
///
/// In every round the partner's segment for this rank is still the one it
/// started with: a rank only overwrites segment `q` in the round where `q`
/// is its partner.
async fn direct<T: Element>(
    client: &HypercubeClient,
    epoch: u32,
    buf: &mut ExchangeBuffer<T>,
) -> Result<()> {
    let world = client.world_size();
    let rank = client.rank();

    for step in 1..world {
        let peer = rank ^ step;
        let ctx = round_ctx(epoch, world, step - 1);
        let received = swap(client, ctx, peer, buf.as_slice()).await?;
        let theirs = ExchangeBuffer::with_segments(received, buf.segment_len())?;
        buf.write_segment(peer as usize, theirs.segment(rank as usize)?)?;
        report(client, ctx, peer, buf.len());
    }
    Ok(())
}

/// Dimension-ordered exchange with block shuffles, `log2(N)` rounds.
async fn mesh<T: Element>(
    client: &HypercubeClient,
    epoch: u32,
    buf: &mut ExchangeBuffer<T>,
) -> Result<()> {
    let world = client.world_size();
    let rank = client.rank();

    for round in 0..ceil_log2(world) {
        let peer = rank ^ (1 << round);
        let ctx = round_ctx(epoch, world, round);
        let received = swap(client, ctx, peer, buf.as_slice()).await?;
        buf.shuffle_blocks(round, rank < peer, &received)?;
        report(client, ctx, peer, buf.len());
    }
    Ok(())
}

fn round_ctx(epoch: u32, world_size: u32, round: u32) -> RoundCtx {
    RoundCtx {
        epoch,
        operation: OP,
        world_size,
        round,
    }
}

async fn swap<T: Element>(
    client: &HypercubeClient,
    ctx: RoundCtx,
    peer: Rank,
    values: &[T],
) -> Result<Vec<T>> {
    exchange_elements(
        client,
        ctx,
        Endpoint::physical(client.rank()),
        Endpoint::physical(peer),
        peer,
        values,
    )
    .await
}

fn report(client: &HypercubeClient, ctx: RoundCtx, peer: Rank, elements: usize) {
    client.observer().round(&RoundEvent {
        operation: OP,
        rank: client.rank(),
        round: ctx.round,
        participant: Participant::Physical(client.rank()),
        partner: peer,
        route: Route::Remote { host: peer },
        elements,
    });
}
