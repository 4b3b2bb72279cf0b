use super::Transport;
use super::inbox::{TaggedFrame, TaggedInbox};
use crate::error::{HypercastError, Result};
use crate::types::Rank;
use futures::future::BoxFuture;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Frames buffered per directed link before a sender waits.
const LINK_CAPACITY: usize = 64;

/// In-process transport: every pair of ranks is linked by a tokio channel.
///
/// Dropping an endpoint closes its outgoing links, so peers waiting on it
/// fail with `PeerDisconnected` instead of hanging.
pub struct LocalTransport {
    rank: Rank,
    world_size: u32,
    outgoing: HashMap<Rank, mpsc::Sender<TaggedFrame>>,
    inboxes: HashMap<Rank, TaggedInbox>,
}

impl LocalTransport {
    /// Build a fully connected world of `world_size` endpoints.
    ///
    /// Endpoint `i` of the returned vector has rank `i`.
    pub fn mesh(world_size: u32) -> Vec<LocalTransport> {
        let n = world_size as usize;
        let mut outgoing: Vec<HashMap<Rank, mpsc::Sender<TaggedFrame>>> =
            (0..n).map(|_| HashMap::new()).collect();
        let mut inboxes: Vec<HashMap<Rank, TaggedInbox>> =
            (0..n).map(|_| HashMap::new()).collect();

        for src in 0..world_size {
            for dst in 0..world_size {
                let (tx, rx) = mpsc::channel(LINK_CAPACITY);
                outgoing[src as usize].insert(dst, tx);
                inboxes[dst as usize].insert(src, TaggedInbox::new(src, rx));
            }
        }

        outgoing
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outgoing, inboxes))| LocalTransport {
                rank: rank as Rank,
                world_size,
                outgoing,
                inboxes,
            })
            .collect()
    }
}

impl Transport for LocalTransport {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn world_size(&self) -> u32 {
        self.world_size
    }

    fn send_tagged<'a>(
        &'a self,
        dest: Rank,
        tag: u64,
        data: &'a [u8],
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let tx = self
                .outgoing
                .get(&dest)
                .ok_or(HypercastError::UnknownPeer { rank: dest })?;
            tx.send((tag, data.to_vec()))
                .await
                .map_err(|_| HypercastError::PeerDisconnected { rank: dest })
        })
    }

    fn recv_tagged<'a>(&'a self, src: Rank, tag: u64) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            let inbox = self
                .inboxes
                .get(&src)
                .ok_or(HypercastError::UnknownPeer { rank: src })?;
            inbox.recv(tag).await
        })
    }
}
