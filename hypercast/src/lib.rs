//! Hypercube collectives for a fixed world of ranks.
//!
//! Two data-exchange patterns run over a binary hypercube:
//!
//! - **All-to-all broadcast** (allgather): every rank ends with every rank's
//!   block, ordered by rank. Works for any world size; missing hypercube
//!   corners are simulated by virtual ranks hosted on low physical ranks.
//! - **All-to-all personalized**: every rank sends a distinct block to every
//!   other rank, either by pairwise direct exchange or by dimension-ordered
//!   mesh shuffling. Power-of-two worlds only.
//!
//! Each rank owns one [`HypercubeClient`]; [`SyncClient`] wraps it for
//! blocking callers.

pub mod client;
pub(crate) mod collective;
pub mod config;
pub mod element;
pub mod error;
pub mod memory;
pub mod observer;
pub mod protocol;
pub mod topology;
pub mod transport;
pub mod types;

pub use client::{HypercubeClient, SyncClient};
pub use config::HypercastConfig;
pub use element::Element;
pub use error::{HypercastError, Result};
pub use memory::ExchangeBuffer;
pub use observer::{
    NoopObserver, RecordedCall, RoundEvent, RoundObserver, RoundRecorder, Route, TracingObserver,
};
pub use topology::{HypercubeLayout, Participant};
pub use transport::{LocalTransport, TcpTransport, Transport};
pub use types::{CubeId, Operation, PersonalizedStrategy, Rank};
