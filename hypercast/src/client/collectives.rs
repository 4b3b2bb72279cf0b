use crate::element::Element;
use crate::error::{HypercastError, Result};
use crate::protocol::USER_TAG_BIT;
use crate::types::{PersonalizedStrategy, Rank};

use super::HypercubeClient;

impl HypercubeClient {
    /// All-to-all broadcast (allgather) over the hypercube.
    ///
    /// `send` holds this rank's `size` elements. Returns `world_size * size`
    /// elements on every rank, rank `p`'s contribution at
    /// `[p * size, (p + 1) * size)`. Works for any world size; worlds that
    /// are not a power of two are padded with virtual ranks.
    pub async fn all_to_all_broadcast<T: Element>(
        &self,
        send: &[T],
        size: usize,
    ) -> Result<Vec<T>> {
        crate::collective::hypercube_allgather(self, send, size).await
    }

    /// All-to-all personalized exchange using the configured strategy.
    ///
    /// `send` holds `world_size * size` elements; segment `p` is for rank
    /// `p`. Returns segment `p` = what rank `p` sent to this rank.
    pub async fn all_to_all_personalized<T: Element>(
        &self,
        send: &[T],
        size: usize,
    ) -> Result<Vec<T>> {
        let strategy = self.config.personalized_strategy;
        self.all_to_all_personalized_with(send, size, strategy)
            .await
    }

    /// All-to-all personalized exchange with an explicit strategy.
    ///
    /// Fails with `NonPowerOfTwoWorld` before communicating when the world
    /// size is not a power of two.
    pub async fn all_to_all_personalized_with<T: Element>(
        &self,
        send: &[T],
        size: usize,
        strategy: PersonalizedStrategy,
    ) -> Result<Vec<T>> {
        crate::collective::all_to_all_personalized(self, send, size, strategy).await
    }

    /// Barrier: block until all ranks reach this point.
    pub async fn barrier(&self) -> Result<()> {
        crate::collective::barrier(self, self.config.barrier_timeout).await
    }

    /// Maximum of `value` over all ranks, delivered to rank 0.
    ///
    /// Returns `Some(max)` on rank 0 and `None` everywhere else.
    pub async fn reduce_max(&self, value: f64) -> Result<Option<f64>> {
        crate::collective::reduce_max(self, value).await
    }

    /// Two-way exchange of raw bytes with one peer.
    ///
    /// Both sides must call this with each other's rank and the same `tag`.
    /// The send and the receive run concurrently. Tags must be below
    /// [`USER_TAG_BIT`]; on the wire they carry that bit, which keeps them
    /// apart from the tags collectives use.
    pub async fn exchange_with(&self, peer: Rank, tag: u64, data: &[u8]) -> Result<Vec<u8>> {
        if peer >= self.world_size() {
            return Err(HypercastError::InvalidRank {
                rank: peer,
                world_size: self.world_size(),
            });
        }
        if tag & USER_TAG_BIT != 0 {
            return Err(HypercastError::InvalidConfig {
                key: "tag",
                value: format!("{tag:#x}"),
            });
        }
        let tag = tag | USER_TAG_BIT;
        let op = crate::types::Operation::Exchange;
        let (_, received) = tokio::try_join!(
            crate::collective::collective_send(self, op, peer, tag, data),
            crate::collective::collective_recv(self, op, peer, tag),
        )?;
        Ok(received)
    }
}
