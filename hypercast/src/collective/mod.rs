//! Collective algorithms, written against [`HypercubeClient`](crate::client::HypercubeClient).
//!
//! Every function here is collective: all ranks of the world must call it
//! with matching arguments, in the same order relative to other collectives.

mod barrier;
mod broadcast;
mod helpers;
mod personalized;
mod reduce;

pub(crate) use barrier::barrier;
pub(crate) use broadcast::hypercube_allgather;
pub(crate) use helpers::{collective_recv, collective_send};
pub(crate) use personalized::all_to_all_personalized;
pub(crate) use reduce::reduce_max;
