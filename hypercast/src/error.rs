use crate::types::Rank;

pub type Result<T> = std::result::Result<T, HypercastError>;

#[derive(Debug, thiserror::Error)]
pub enum HypercastError {
    // ── Configuration: detected locally, before any communication ──
    #[error("{operation} requires a power-of-two world size, got {world_size}")]
    NonPowerOfTwoWorld {
        operation: &'static str,
        world_size: u32,
    },

    #[error("{operation} requires a non-zero segment size")]
    ZeroSize { operation: &'static str },

    #[error("{operation} expected {expected} input elements, got {actual}")]
    InputLengthMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{operation} would move {bytes} bytes per link, limit is {limit}")]
    PayloadTooLarge {
        operation: &'static str,
        bytes: usize,
        limit: usize,
    },

    #[error("invalid rank {rank}: world size is {world_size}")]
    InvalidRank { rank: Rank, world_size: u32 },

    #[error("invalid configuration value for {key}: {value:?}")]
    InvalidConfig { key: &'static str, value: String },

    // ── Communication: fatal to the collective call ──
    #[error("{operation} failed at rank {rank}: {reason}")]
    CollectiveFailed {
        operation: &'static str,
        rank: Rank,
        reason: String,
    },

    #[error("peer {rank} disconnected unexpectedly")]
    PeerDisconnected { rank: Rank },

    #[error("rank {rank} not found in world")]
    UnknownPeer { rank: Rank },

    #[error("buffer size mismatch: expected {expected} elements, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("frame decode failed: {0}")]
    DecodeFailed(String),

    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Internal ──
    #[error("topology invariant violated in {operation}: {detail}")]
    TopologyInvariant {
        operation: &'static str,
        detail: String,
    },
}

impl HypercastError {
    /// Create a `Transport` error with just a message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a `Transport` error with a message and a source error.
    pub fn transport_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True for errors raised locally before any message was exchanged.
    ///
    /// Every rank computes these from the same inputs, so a configuration
    /// error on one rank is a configuration error on all of them and no
    /// peer is left blocked.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NonPowerOfTwoWorld { .. }
                | Self::ZeroSize { .. }
                | Self::InputLengthMismatch { .. }
                | Self::PayloadTooLarge { .. }
                | Self::InvalidRank { .. }
                | Self::InvalidConfig { .. }
        )
    }

    /// True for internal invariant violations (mismatched world views).
    pub fn is_topology_invariant(&self) -> bool {
        matches!(self, Self::TopologyInvariant { .. })
    }
}
