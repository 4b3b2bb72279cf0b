use crate::client::HypercubeClient;
use crate::element::{self, Element};
use crate::error::{HypercastError, Result};
use crate::protocol::{FrameHeader, Lane, exchange_tag};
use crate::types::{CubeId, Operation, Rank};
use std::future::Future;
use std::time::Duration;

/// Position of one exchange within a collective call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RoundCtx {
    pub epoch: u32,
    pub operation: Operation,
    pub world_size: u32,
    pub round: u32,
}

impl RoundCtx {
    /// Header this side stamps on a frame from `from` to `to`.
    pub fn header(&self, from: CubeId, to: CubeId) -> FrameHeader {
        FrameHeader {
            operation: self.operation,
            round: self.round as u16,
            world_size: self.world_size,
            from,
            to,
        }
    }

    pub fn tag(&self, lane: Lane) -> u64 {
        exchange_tag(self.epoch, self.operation, lane, self.round)
    }
}

/// One end of a hypercube exchange: an identity and the rank holding it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Endpoint {
    pub id: CubeId,
    pub lane: Lane,
}

impl Endpoint {
    pub fn physical(rank: Rank) -> Self {
        Self {
            id: rank,
            lane: Lane::Physical,
        }
    }

    /// Endpoint for hypercube id `id` in a world of `world_size` ranks.
    pub fn for_id(id: CubeId, world_size: u32) -> Self {
        let lane = if id < world_size {
            Lane::Physical
        } else {
            Lane::Virtual
        };
        Self { id, lane }
    }
}

/// Fail a call up front if its largest exchange exceeds the link limit.
///
/// `bytes` is `None` when the size computation overflowed; that is always
/// over the limit.
pub(crate) fn check_payload(
    client: &HypercubeClient,
    operation: Operation,
    bytes: Option<usize>,
) -> Result<()> {
    let limit = client.config().max_link_payload_bytes;
    match bytes {
        Some(bytes) if bytes <= limit => Ok(()),
        bytes => Err(HypercastError::PayloadTooLarge {
            operation: operation.name(),
            bytes: bytes.unwrap_or(usize::MAX),
            limit,
        }),
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    operation: Operation,
    peer: Rank,
    what: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(HypercastError::CollectiveFailed {
            operation: operation.name(),
            rank: peer,
            reason: e.to_string(),
        }),
        Err(_) => Err(HypercastError::CollectiveFailed {
            operation: operation.name(),
            rank: peer,
            reason: format!("{what} timed out after {}ms", timeout.as_millis()),
        }),
    }
}

/// Send bytes to a peer with timeout, wrapping errors as `CollectiveFailed`.
pub(crate) async fn collective_send(
    client: &HypercubeClient,
    operation: Operation,
    dest: Rank,
    tag: u64,
    data: &[u8],
) -> Result<()> {
    let timeout = client.config().collective_timeout;
    with_timeout(
        timeout,
        operation,
        dest,
        "send",
        client.transport().send_tagged(dest, tag, data),
    )
    .await
}

/// Receive bytes from a peer with timeout, wrapping errors as `CollectiveFailed`.
pub(crate) async fn collective_recv(
    client: &HypercubeClient,
    operation: Operation,
    src: Rank,
    tag: u64,
) -> Result<Vec<u8>> {
    let timeout = client.config().collective_timeout;
    with_timeout(
        timeout,
        operation,
        src,
        "recv",
        client.transport().recv_tagged(src, tag),
    )
    .await
}

/// Send a framed payload from `me` to `to` while receiving the frame sent
/// from `from` to `me`. The two directions run concurrently, so paired
/// ranks never wait on each other's send.
///
/// The received header is checked against what this side expects; the
/// returned bytes are the payload only.
pub(crate) async fn framed_send_recv(
    client: &HypercubeClient,
    ctx: RoundCtx,
    me: Endpoint,
    to: (Endpoint, Rank),
    from: (Endpoint, Rank),
    payload: &[u8],
) -> Result<Vec<u8>> {
    let (to_ep, to_host) = to;
    let (from_ep, from_host) = from;
    let frame = ctx.header(me.id, to_ep.id).frame(payload);
    let (_, received) = tokio::try_join!(
        collective_send(client, ctx.operation, to_host, ctx.tag(me.lane), &frame),
        collective_recv(client, ctx.operation, from_host, ctx.tag(from_ep.lane)),
    )?;
    let (header, body) = FrameHeader::split(&received)?;
    header.verify(&ctx.header(from_ep.id, me.id))?;
    Ok(body.to_vec())
}

/// Two-way exchange of `values` with the identity `partner`, held by `host`.
///
/// The reply must carry exactly `values.len()` elements.
pub(crate) async fn exchange_elements<T: Element>(
    client: &HypercubeClient,
    ctx: RoundCtx,
    me: Endpoint,
    partner: Endpoint,
    host: Rank,
    values: &[T],
) -> Result<Vec<T>> {
    let payload = element::encode(values);
    let body = framed_send_recv(
        client,
        ctx,
        me,
        (partner, host),
        (partner, host),
        &payload,
    )
    .await?;
    element::decode(&body, values.len())
}
