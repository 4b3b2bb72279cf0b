//! The message-passing substrate collectives run on.
//!
//! A [`Transport`] delivers tagged byte frames between ranks, reliably and
//! in order per `(peer, tag)`. Two implementations ship with the crate: an
//! in-process mesh for tests and single-process worlds, and a TCP mesh for
//! real multi-process jobs.

mod inbox;
mod local;
mod tcp;

pub(crate) use inbox::TaggedInbox;
pub use local::LocalTransport;
pub use tcp::{TcpTransport, tcp_mesh_local};

use crate::error::Result;
use crate::types::Rank;
use futures::future::BoxFuture;

/// Point-to-point tagged messaging between the ranks of one world.
///
/// Frames sent by one rank to the same destination under the same tag are
/// received in send order. Frames under different tags are independent: a
/// receive for tag `b` never consumes a frame sent with tag `a`.
pub trait Transport: Send + Sync {
    /// This endpoint's rank (0-indexed).
    fn rank(&self) -> Rank;

    /// Total number of ranks reachable through this transport, self included.
    fn world_size(&self) -> u32;

    /// Send a frame to `dest` under `tag`.
    fn send_tagged<'a>(&'a self, dest: Rank, tag: u64, data: &'a [u8]) -> BoxFuture<'a, Result<()>>;

    /// Receive the next frame sent by `src` under `tag`.
    fn recv_tagged<'a>(&'a self, src: Rank, tag: u64) -> BoxFuture<'a, Result<Vec<u8>>>;
}
