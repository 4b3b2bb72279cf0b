use crate::error::{HypercastError, Result};
use crate::types::Rank;
use std::collections::{HashMap, VecDeque};
use tokio::sync::{Mutex, mpsc};

/// A tagged frame as it arrives from one peer.
pub(crate) type TaggedFrame = (u64, Vec<u8>);

struct InboxState {
    rx: mpsc::Receiver<TaggedFrame>,
    /// Frames that arrived before anyone asked for their tag.
    pending: HashMap<u64, VecDeque<Vec<u8>>>,
}

/// Demultiplexes one peer's frame stream by tag.
///
/// Frames whose tag nobody is waiting for are parked until a receive for
/// that tag comes in, so per-tag order is the arrival order.
pub(crate) struct TaggedInbox {
    peer: Rank,
    state: Mutex<InboxState>,
}

impl TaggedInbox {
    pub(crate) fn new(peer: Rank, rx: mpsc::Receiver<TaggedFrame>) -> Self {
        Self {
            peer,
            state: Mutex::new(InboxState {
                rx,
                pending: HashMap::new(),
            }),
        }
    }

    /// Receive the next frame carrying `tag`.
    ///
    /// Fails with `PeerDisconnected` once the peer's stream has ended and
    /// nothing for `tag` is parked.
    pub(crate) async fn recv(&self, tag: u64) -> Result<Vec<u8>> {
        let mut st = self.state.lock().await;
        if let Some(queue) = st.pending.get_mut(&tag)
            && let Some(frame) = queue.pop_front()
        {
            if queue.is_empty() {
                st.pending.remove(&tag);
            }
            return Ok(frame);
        }
        loop {
            match st.rx.recv().await {
                Some((t, data)) if t == tag => return Ok(data),
                Some((t, data)) => {
                    tracing::trace!(peer = self.peer, tag = t, "parking frame for later receive");
                    st.pending.entry(t).or_default().push_back(data);
                }
                None => return Err(HypercastError::PeerDisconnected { rank: self.peer }),
            }
        }
    }
}
