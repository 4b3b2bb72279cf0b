use crate::config::HypercastConfig;
use crate::element::Element;
use crate::error::{HypercastError, Result};
use crate::types::{PersonalizedStrategy, Rank};

/// Blocking wrapper around [`HypercubeClient`](super::HypercubeClient).
///
/// Owns a `tokio::runtime::Runtime` and calls `block_on()` for each operation.
/// Ranks of one world must run on separate OS threads: a collective blocks
/// until every rank has joined it.
pub struct SyncClient {
    inner: super::HypercubeClient,
    rt: tokio::runtime::Runtime,
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .map_err(|e| HypercastError::transport_with_source("tokio runtime", e))
}

impl SyncClient {
    /// Bootstrap an in-process world and return sync clients for each rank.
    pub fn bootstrap_local(world_size: u32) -> Result<Vec<Self>> {
        Self::bootstrap_local_with_config(world_size, HypercastConfig::default())
    }

    /// Same as [`bootstrap_local`](Self::bootstrap_local) with explicit config.
    pub fn bootstrap_local_with_config(
        world_size: u32,
        config: HypercastConfig,
    ) -> Result<Vec<Self>> {
        // Each SyncClient needs its own runtime since `block_on` is exclusive.
        super::HypercubeClient::bootstrap_local_with_config(world_size, config)
            .into_iter()
            .map(Self::from_async)
            .collect()
    }

    /// Wrap an existing async client with a new tokio runtime.
    pub fn from_async(inner: super::HypercubeClient) -> Result<Self> {
        Ok(Self {
            inner,
            rt: runtime()?,
        })
    }

    /// This client's rank (0-indexed).
    pub fn rank(&self) -> Rank {
        self.inner.rank()
    }

    /// Total number of ranks in the world.
    pub fn world_size(&self) -> u32 {
        self.inner.world_size()
    }

    /// Blocking [`HypercubeClient::all_to_all_broadcast`](super::HypercubeClient::all_to_all_broadcast).
    pub fn all_to_all_broadcast<T: Element>(&self, send: &[T], size: usize) -> Result<Vec<T>> {
        self.rt.block_on(self.inner.all_to_all_broadcast(send, size))
    }

    /// Blocking all-to-all personalized exchange with the configured strategy.
    pub fn all_to_all_personalized<T: Element>(&self, send: &[T], size: usize) -> Result<Vec<T>> {
        self.rt
            .block_on(self.inner.all_to_all_personalized(send, size))
    }

    pub fn all_to_all_personalized_with<T: Element>(
        &self,
        send: &[T],
        size: usize,
        strategy: PersonalizedStrategy,
    ) -> Result<Vec<T>> {
        self.rt
            .block_on(self.inner.all_to_all_personalized_with(send, size, strategy))
    }

    /// Barrier: block until all ranks reach this point.
    pub fn barrier(&self) -> Result<()> {
        self.rt.block_on(self.inner.barrier())
    }

    /// Maximum over all ranks; `Some` on rank 0 only.
    pub fn reduce_max(&self, value: f64) -> Result<Option<f64>> {
        self.rt.block_on(self.inner.reduce_max(value))
    }

    pub fn exchange_with(&self, peer: Rank, tag: u64, data: &[u8]) -> Result<Vec<u8>> {
        self.rt.block_on(self.inner.exchange_with(peer, tag, data))
    }

    /// Access the underlying async client.
    pub fn inner(&self) -> &super::HypercubeClient {
        &self.inner
    }
}
