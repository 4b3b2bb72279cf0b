//! Diagnostics hooks for collective calls.
//!
//! Engines report what they do through a [`RoundObserver`] injected into the
//! client; they never log inline. Observers see events after the fact and
//! cannot influence the protocol.

use crate::topology::Participant;
use crate::types::{CubeId, Operation, Rank};
use std::sync::Mutex;

/// How one participant's exchange in a round was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Partner buffer lives on this rank; no message was sent.
    Local,
    /// Two-way exchange with the physical rank holding the partner.
    Remote { host: Rank },
}

/// One participant's exchange in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundEvent {
    pub operation: Operation,
    pub rank: Rank,
    pub round: u32,
    pub participant: Participant,
    pub partner: CubeId,
    pub route: Route,
    /// Elements held by the participant after the round.
    pub elements: usize,
}

/// Receives progress events from collective engines.
///
/// Every method has an empty default so implementors pick what they need.
pub trait RoundObserver: Send + Sync {
    fn call_started(&self, _operation: Operation, _rank: Rank, _world_size: u32, _rounds: u32) {}

    fn round(&self, _event: &RoundEvent) {}

    fn call_finished(&self, _operation: Operation, _rank: Rank, _rounds: u32) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RoundObserver for NoopObserver {}

/// Forwards events to `tracing` at debug (calls) and trace (rounds) level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RoundObserver for TracingObserver {
    fn call_started(&self, operation: Operation, rank: Rank, world_size: u32, rounds: u32) {
        tracing::debug!(%operation, rank, world_size, rounds, "collective started");
    }

    fn round(&self, e: &RoundEvent) {
        match e.route {
            Route::Local => tracing::trace!(
                operation = %e.operation,
                rank = e.rank,
                round = e.round,
                participant = %e.participant,
                partner = e.partner,
                elements = e.elements,
                "local exchange"
            ),
            Route::Remote { host } => tracing::trace!(
                operation = %e.operation,
                rank = e.rank,
                round = e.round,
                participant = %e.participant,
                partner = e.partner,
                host,
                elements = e.elements,
                "remote exchange"
            ),
        }
    }

    fn call_finished(&self, operation: Operation, rank: Rank, rounds: u32) {
        tracing::debug!(%operation, rank, rounds, "collective finished");
    }
}

/// Everything a [`RoundRecorder`] has seen for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub planned_rounds: u32,
    pub completed_rounds: Option<u32>,
    pub events: Vec<RoundEvent>,
}

/// Keeps every event in memory, grouped per call.
#[derive(Debug, Default)]
pub struct RoundRecorder {
    calls: Mutex<Vec<RecordedCall>>,
}

impl RoundRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded calls, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    /// The most recent call, if any.
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RecordedCall>> {
        // A panic while holding the lock cannot leave the log half-written.
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RoundObserver for RoundRecorder {
    fn call_started(&self, operation: Operation, _rank: Rank, _world_size: u32, rounds: u32) {
        self.lock().push(RecordedCall {
            operation,
            planned_rounds: rounds,
            completed_rounds: None,
            events: Vec::new(),
        });
    }

    fn round(&self, event: &RoundEvent) {
        if let Some(call) = self.lock().last_mut() {
            call.events.push(*event);
        }
    }

    fn call_finished(&self, _operation: Operation, _rank: Rank, rounds: u32) {
        if let Some(call) = self.lock().last_mut() {
            call.completed_rounds = Some(rounds);
        }
    }
}
