use crate::client::HypercubeClient;
use crate::config::HypercastConfig;
use crate::error::Result;
use crate::transport::{LocalTransport, TcpTransport, tcp_mesh_local};
use crate::types::Rank;
use std::net::SocketAddr;

impl HypercubeClient {
    /// Bootstrap an in-process world of `world_size` clients.
    ///
    /// Client `i` has rank `i`. This is a convenience for tests and for
    /// single-process jobs where every rank runs as a tokio task.
    pub fn bootstrap_local(world_size: u32) -> Vec<HypercubeClient> {
        Self::bootstrap_local_with_config(world_size, HypercastConfig::default())
    }

    /// Same as [`bootstrap_local`](Self::bootstrap_local) with explicit config.
    pub fn bootstrap_local_with_config(
        world_size: u32,
        config: HypercastConfig,
    ) -> Vec<HypercubeClient> {
        LocalTransport::mesh(world_size)
            .into_iter()
            .map(|t| HypercubeClient::with_config(t, config.clone()))
            .collect()
    }

    /// Bootstrap a world over loopback TCP, one socket per pair of ranks.
    pub async fn bootstrap_tcp_local(world_size: u32) -> Result<Vec<HypercubeClient>> {
        let transports = tcp_mesh_local(world_size).await?;
        tracing::debug!(world_size, "loopback tcp world ready");
        Ok(transports.into_iter().map(HypercubeClient::new).collect())
    }

    /// Join a multi-process world over TCP.
    ///
    /// Every process passes the same `addrs`; this one binds `addrs[rank]`.
    pub async fn connect_tcp(
        rank: Rank,
        addrs: &[SocketAddr],
        config: HypercastConfig,
    ) -> Result<HypercubeClient> {
        let transport = TcpTransport::bind_and_connect(rank, addrs).await?;
        Ok(HypercubeClient::with_config(transport, config))
    }
}
