use crate::client::HypercubeClient;
use crate::collective::helpers::{Endpoint, RoundCtx, check_payload, exchange_elements};
use crate::element::Element;
use crate::error::{HypercastError, Result};
use crate::memory::ExchangeBuffer;
use crate::observer::{RoundEvent, Route};
use crate::topology::{HypercubeLayout, Participant, partner};
use crate::types::{CubeId, Operation};

const OP: Operation = Operation::AllToAllBroadcast;

/// Hypercube all-to-all broadcast: every rank contributes `size` elements,
/// every rank receives all contributions concatenated in rank order.
///
/// Runs `ceil_log2(N)` rounds. In round `i` each identity swaps its whole
/// buffer with `id ^ 2^i` and the buffer doubles, lower id first. For a
/// world that is not a power of two, the missing ids are played by hosts
/// (see [`HypercubeLayout`]); a host runs up to two exchanges per round,
/// always its own first, then its virtual rank's. In the last round the
/// host's two identities are partners and swap locally.
pub(crate) async fn hypercube_allgather<T: Element>(
    client: &HypercubeClient,
    send: &[T],
    size: usize,
) -> Result<Vec<T>> {
    let world = client.world_size();
    let rank = client.rank();

    if size == 0 {
        return Err(HypercastError::ZeroSize {
            operation: OP.name(),
        });
    }
    if send.len() != size {
        return Err(HypercastError::InputLengthMismatch {
            operation: OP.name(),
            expected: size,
            actual: send.len(),
        });
    }

    let layout = HypercubeLayout::new(rank, world);
    let dimension = layout.dimension();
    // The last round moves half of the padded cube's data.
    let largest = (layout.padded_size() as usize / 2)
        .max(1)
        .checked_mul(size)
        .and_then(|n| n.checked_mul(T::WIDTH));
    check_payload(client, OP, largest)?;

    let epoch = client.next_epoch();
    let observer = client.observer();
    observer.call_started(OP, rank, world, dimension);

    let mut own = ExchangeBuffer::single(send);
    // The virtual rank contributes a copy of the host's data as filler.
    // Its slot lies past the last real rank and is cut off at the end.
    let mut hosted: Option<(CubeId, ExchangeBuffer<T>)> = layout
        .hosted_virtual()
        .map(|vid| (vid, ExchangeBuffer::single(send)));

    for round in 0..dimension {
        let ctx = RoundCtx {
            epoch,
            operation: OP,
            world_size: world,
            round,
        };
        let own_partner = partner(rank, round);

        let swap_locally = hosted.as_ref().is_some_and(|(vid, _)| *vid == own_partner);
        if let Some((vid, vbuf)) = hosted.as_mut().filter(|_| swap_locally) {
            let before = own.as_slice().to_vec();
            own.merge(rank, *vid, vbuf.as_slice())?;
            vbuf.merge(*vid, rank, &before)?;
            let local = |participant, partner, elements| RoundEvent {
                operation: OP,
                rank,
                round,
                participant,
                partner,
                route: Route::Local,
                elements,
            };
            observer.round(&local(Participant::Physical(rank), *vid, own.len()));
            observer.round(&local(Participant::Virtual(*vid), rank, vbuf.len()));
            continue;
        }

        exchange_remote(client, ctx, &layout, Participant::Physical(rank), &mut own).await?;
        if let Some((vid, vbuf)) = hosted.as_mut() {
            exchange_remote(client, ctx, &layout, Participant::Virtual(*vid), vbuf).await?;
        }
    }

    observer.call_finished(OP, rank, dimension);
    own.into_prefix(world as usize)
}

/// Swap `buf` with the partner of `me` in this round, wherever it lives.
async fn exchange_remote<T: Element>(
    client: &HypercubeClient,
    ctx: RoundCtx,
    layout: &HypercubeLayout,
    me: Participant,
    buf: &mut ExchangeBuffer<T>,
) -> Result<()> {
    let expected = buf.len_at_round(ctx.round);
    if buf.len() != expected {
        return Err(HypercastError::TopologyInvariant {
            operation: OP.name(),
            detail: format!(
                "{me} holds {} elements entering round {}, expected {expected}",
                buf.len(),
                ctx.round
            ),
        });
    }

    let partner_id = partner(me.id(), ctx.round);
    let host = layout.host_of(partner_id);
    let received = exchange_elements(
        client,
        ctx,
        Endpoint::for_id(me.id(), ctx.world_size),
        Endpoint::for_id(partner_id, ctx.world_size),
        host,
        buf.as_slice(),
    )
    .await?;
    buf.merge(me.id(), partner_id, &received)?;

    client.observer().round(&RoundEvent {
        operation: OP,
        rank: layout.rank(),
        round: ctx.round,
        participant: me,
        partner: partner_id,
        route: Route::Remote { host },
        elements: buf.len(),
    });
    Ok(())
}
