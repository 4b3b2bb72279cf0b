//! Runtime-configurable tuning parameters for hypercast.
//!
//! All values have sensible defaults. Override via environment variables
//! (prefixed `HYPERCAST_`) or by constructing a custom `HypercastConfig`.

use crate::types::PersonalizedStrategy;
use std::str::FromStr;
use std::time::Duration;

/// Tuning parameters for collective operations and transport.
#[derive(Debug, Clone)]
pub struct HypercastConfig {
    /// Timeout for a single two-way exchange within a collective.
    pub collective_timeout: Duration,

    /// Timeout for barrier operations.
    pub barrier_timeout: Duration,

    /// Largest payload a single exchange may carry, in bytes.
    ///
    /// Collectives check their largest round against this before sending
    /// anything, so every rank rejects an oversized call the same way.
    pub max_link_payload_bytes: usize,

    /// Strategy used by `all_to_all_personalized` when none is given.
    pub personalized_strategy: PersonalizedStrategy,
}

impl Default for HypercastConfig {
    fn default() -> Self {
        Self {
            collective_timeout: Duration::from_secs(30),
            barrier_timeout: Duration::from_secs(30),
            max_link_payload_bytes: 256 * 1024 * 1024, // 256 MiB
            personalized_strategy: PersonalizedStrategy::Mesh,
        }
    }
}

impl HypercastConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `HYPERCAST_COLLECTIVE_TIMEOUT_SECS`
    /// - `HYPERCAST_BARRIER_TIMEOUT_SECS`
    /// - `HYPERCAST_MAX_LINK_PAYLOAD_BYTES`
    /// - `HYPERCAST_PERSONALIZED_STRATEGY` (`mesh` or `direct`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(s) = parse_var::<u64>(&lookup, "HYPERCAST_COLLECTIVE_TIMEOUT_SECS") {
            cfg.collective_timeout = Duration::from_secs(s);
        }
        if let Some(s) = parse_var::<u64>(&lookup, "HYPERCAST_BARRIER_TIMEOUT_SECS") {
            cfg.barrier_timeout = Duration::from_secs(s);
        }
        if let Some(n) = parse_var::<usize>(&lookup, "HYPERCAST_MAX_LINK_PAYLOAD_BYTES") {
            cfg.max_link_payload_bytes = n;
        }
        if let Some(s) =
            parse_var::<PersonalizedStrategy>(&lookup, "HYPERCAST_PERSONALIZED_STRATEGY")
        {
            cfg.personalized_strategy = s;
        }

        cfg
    }
}

/// Read and parse one variable. Unparsable values are logged and ignored.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(
                key,
                value = %raw,
                error = %e,
                "ignoring unparsable config override"
            );
            None
        }
    }
}
