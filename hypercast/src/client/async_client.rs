use crate::config::HypercastConfig;
use crate::observer::{NoopObserver, RoundObserver};
use crate::transport::Transport;
use crate::types::Rank;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// The main async API for hypercast collectives.
///
/// One client per rank. It owns that rank's transport endpoint, the tuning
/// parameters, and the observer that receives per-round diagnostics. Rank
/// and world size come from the transport and never change.
///
/// # Example
///
/// ```no_run
/// use hypercast::HypercubeClient;
///
/// # async fn example() -> hypercast::Result<()> {
/// let clients = HypercubeClient::bootstrap_local(3);
/// assert_eq!(clients[0].rank(), 0);
/// assert_eq!(clients[0].world_size(), 3);
/// # Ok(())
/// # }
/// ```
pub struct HypercubeClient {
    pub(super) transport: Box<dyn Transport>,
    pub(super) config: HypercastConfig,
    pub(super) observer: Arc<dyn RoundObserver>,
    /// Per-client call counter. Every rank runs the same sequence of
    /// collectives, so counters advance in lockstep and tag frames of
    /// consecutive calls apart.
    pub(super) epoch: AtomicU32,
}

impl HypercubeClient {
    /// Wrap a transport endpoint with default configuration.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_config(transport, HypercastConfig::default())
    }

    /// Wrap a transport endpoint with explicit configuration.
    pub fn with_config(transport: impl Transport + 'static, config: HypercastConfig) -> Self {
        Self {
            transport: Box::new(transport),
            config,
            observer: Arc::new(NoopObserver),
            epoch: AtomicU32::new(1), // Start at 1; tag 0 is never used
        }
    }

    /// Replace the diagnostics observer.
    pub fn with_observer(mut self, observer: Arc<dyn RoundObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// This client's rank (0-indexed).
    pub fn rank(&self) -> Rank {
        self.transport.rank()
    }

    /// Total number of ranks in the world.
    pub fn world_size(&self) -> u32 {
        self.transport.world_size()
    }

    pub fn config(&self) -> &HypercastConfig {
        &self.config
    }

    pub(crate) fn observer(&self) -> &dyn RoundObserver {
        self.observer.as_ref()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Take the epoch for the next collective call.
    pub(crate) fn next_epoch(&self) -> u32 {
        self.epoch.fetch_add(1, Ordering::Relaxed)
    }
}

impl std::fmt::Debug for HypercubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HypercubeClient")
            .field("rank", &self.rank())
            .field("world_size", &self.world_size())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
