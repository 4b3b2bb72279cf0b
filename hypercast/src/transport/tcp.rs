use super::Transport;
use super::inbox::{TaggedFrame, TaggedInbox};
use crate::error::{HypercastError, Result};
use crate::types::Rank;
use futures::future::{BoxFuture, try_join_all};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};

/// Maximum TCP frame size (4 GiB).
const MAX_TCP_FRAME_SIZE: usize = 4 * 1024 * 1024 * 1024;

/// Frames buffered per peer between the socket reader and the inbox.
const INBOX_CAPACITY: usize = 64;

/// How long `connect_mesh` keeps retrying a peer that is not listening yet.
const CONNECT_WINDOW: Duration = Duration::from_secs(30);
const CONNECT_BACKOFF: Duration = Duration::from_millis(50);

/// Transport over one TCP stream per peer, without TLS.
///
/// Every frame is `[tag: u64 LE][len: u64 LE][payload]`. A background task
/// per peer reads frames off the socket and feeds that peer's inbox; when
/// the socket closes the inbox reports `PeerDisconnected`.
pub struct TcpTransport {
    rank: Rank,
    world_size: u32,
    writers: HashMap<Rank, Mutex<WriteHalf<TcpStream>>>,
    inboxes: HashMap<Rank, TaggedInbox>,
    loopback: mpsc::Sender<TaggedFrame>,
    /// Background recv tasks; aborted on drop.
    recv_handles: Vec<tokio::task::JoinHandle<()>>,
}

impl TcpTransport {
    /// Bind `addrs[rank]` and connect to every other address in `addrs`.
    ///
    /// Every rank of the job calls this with the same address list.
    pub async fn bind_and_connect(rank: Rank, addrs: &[SocketAddr]) -> Result<Self> {
        let own = *addrs.get(rank as usize).ok_or(HypercastError::InvalidRank {
            rank,
            world_size: addrs.len() as u32,
        })?;
        let listener = TcpListener::bind(own)
            .await
            .map_err(|e| HypercastError::transport_with_source(format!("tcp bind {own}"), e))?;
        Self::connect_mesh(rank, listener, addrs).await
    }

    /// Build the full mesh from an already-bound listener.
    ///
    /// Rank `r` dials every lower rank and accepts one connection from
    /// every higher rank. Each dialer announces its rank as a `u32 LE`
    /// before any frame.
    pub async fn connect_mesh(
        rank: Rank,
        listener: TcpListener,
        addrs: &[SocketAddr],
    ) -> Result<Self> {
        let world_size = addrs.len() as u32;
        if rank >= world_size {
            return Err(HypercastError::InvalidRank { rank, world_size });
        }

        let dial = try_join_all((0..rank).map(|peer| async move {
            let mut stream = dial_with_retry(addrs[peer as usize]).await?;
            stream
                .write_all(&rank.to_le_bytes())
                .await
                .map_err(|e| {
                    HypercastError::transport_with_source(format!("tcp hello to {peer}"), e)
                })?;
            Ok::<_, HypercastError>((peer, stream))
        }));
        let accept = accept_peers(&listener, rank, world_size);
        let (dialed, accepted) = tokio::try_join!(dial, accept)?;

        let mut writers = HashMap::new();
        let mut inboxes = HashMap::new();
        let mut recv_handles = Vec::new();
        for (peer, stream) in dialed.into_iter().chain(accepted) {
            stream
                .set_nodelay(true)
                .map_err(|e| HypercastError::transport_with_source("tcp set_nodelay", e))?;
            let (reader, writer) = tokio::io::split(stream);
            let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
            recv_handles.push(tokio::spawn(recv_loop(peer, reader, tx)));
            writers.insert(peer, Mutex::new(writer));
            inboxes.insert(peer, TaggedInbox::new(peer, rx));
        }

        let (loopback, loop_rx) = mpsc::channel(INBOX_CAPACITY);
        inboxes.insert(rank, TaggedInbox::new(rank, loop_rx));

        tracing::debug!(rank, world_size, "tcp mesh established");
        Ok(Self {
            rank,
            world_size,
            writers,
            inboxes,
            loopback,
            recv_handles,
        })
    }

    /// Write a tagged frame: `[tag: u64 LE][len: u64 LE][payload]`.
    async fn write_frame(&self, dest: Rank, tag: u64, data: &[u8]) -> Result<()> {
        let writer = self
            .writers
            .get(&dest)
            .ok_or(HypercastError::UnknownPeer { rank: dest })?;
        let mut writer = writer.lock().await;
        let disconnected = |_| HypercastError::PeerDisconnected { rank: dest };
        writer
            .write_all(&tag.to_le_bytes())
            .await
            .map_err(disconnected)?;
        writer
            .write_all(&(data.len() as u64).to_le_bytes())
            .await
            .map_err(disconnected)?;
        writer.write_all(data).await.map_err(disconnected)?;
        writer.flush().await.map_err(disconnected)?;
        Ok(())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        for h in &self.recv_handles {
            h.abort();
        }
    }
}

impl Transport for TcpTransport {
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
            if dest == self.rank {
                return self
                    .loopback
                    .send((tag, data.to_vec()))
                    .await
                    .map_err(|_| HypercastError::PeerDisconnected { rank: dest });
            }
            self.write_frame(dest, tag, data).await
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

/// Bind one loopback listener per rank and connect them into a full mesh.
pub async fn tcp_mesh_local(world_size: u32) -> Result<Vec<TcpTransport>> {
    let mut listeners = Vec::with_capacity(world_size as usize);
    let mut addrs = Vec::with_capacity(world_size as usize);
    for _ in 0..world_size {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .map_err(|e| HypercastError::transport_with_source("tcp listen", e))?;
        addrs.push(listener.local_addr()?);
        listeners.push(listener);
    }
    let addrs = &addrs;
    try_join_all(
        listeners
            .into_iter()
            .enumerate()
            .map(|(rank, l)| TcpTransport::connect_mesh(rank as Rank, l, addrs)),
    )
    .await
}

async fn dial_with_retry(addr: SocketAddr) -> Result<TcpStream> {
    let deadline = tokio::time::Instant::now() + CONNECT_WINDOW;
    loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) if tokio::time::Instant::now() < deadline => {
                tracing::trace!(%addr, error = %e, "peer not listening yet, retrying");
                tokio::time::sleep(CONNECT_BACKOFF).await;
            }
            Err(e) => {
                return Err(HypercastError::transport_with_source(
                    format!("tcp connect {addr}"),
                    e,
                ));
            }
        }
    }
}

async fn accept_peers(
    listener: &TcpListener,
    rank: Rank,
    world_size: u32,
) -> Result<Vec<(Rank, TcpStream)>> {
    let expected = (world_size - rank - 1) as usize;
    let mut accepted = Vec::with_capacity(expected);
    while accepted.len() < expected {
        let (mut stream, addr) = listener
            .accept()
            .await
            .map_err(|e| HypercastError::transport_with_source("tcp accept", e))?;
        let mut hello = [0u8; 4];
        stream.read_exact(&mut hello).await.map_err(|e| {
            HypercastError::transport_with_source(format!("tcp hello from {addr}"), e)
        })?;
        let peer = u32::from_le_bytes(hello);
        if peer <= rank || peer >= world_size {
            return Err(HypercastError::InvalidRank { rank: peer, world_size });
        }
        accepted.push((peer, stream));
    }
    Ok(accepted)
}

/// Background loop: read frames and forward them to the peer's inbox.
async fn recv_loop(peer: Rank, mut reader: ReadHalf<TcpStream>, tx: mpsc::Sender<TaggedFrame>) {
    let mut tag_buf = [0u8; 8];
    let mut len_buf = [0u8; 8];
    loop {
        if let Err(e) = reader.read_exact(&mut tag_buf).await {
            tracing::debug!(peer, "tcp recv loop ended: {e}");
            return;
        }
        if let Err(e) = reader.read_exact(&mut len_buf).await {
            tracing::debug!(peer, "tcp recv loop ended reading len: {e}");
            return;
        }
        let tag = u64::from_le_bytes(tag_buf);
        let len = u64::from_le_bytes(len_buf) as usize;

        if len > MAX_TCP_FRAME_SIZE {
            tracing::warn!(peer, len, "tcp: frame too large, closing connection");
            return;
        }

        let mut payload = vec![0u8; len];
        if let Err(e) = reader.read_exact(&mut payload).await {
            tracing::debug!(peer, "tcp recv loop ended reading payload: {e}");
            return;
        }

        if tx.send((tag, payload)).await.is_err() {
            return;
        }
    }
}
