/// Rank of a participant in the world (0-indexed).
pub type Rank = u32;

/// Identifier of a node in the padded hypercube address space.
///
/// Equal to the physical rank for real participants; ids at or above the
/// world size name virtual ranks emulated by a host.
pub type CubeId = u32;

/// Algorithm used by the all-to-all personalized exchange.
///
/// Both strategies require a power-of-two world size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PersonalizedStrategy {
    /// Pairwise exchange with `rank ^ i` for every `i in 1..N`. `N-1` rounds.
    Direct,
    /// Dimension-ordered exchange with block shuffles. `log2(N)` rounds.
    #[default]
    Mesh,
}

impl PersonalizedStrategy {
    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            PersonalizedStrategy::Direct => "direct",
            PersonalizedStrategy::Mesh => "mesh",
        }
    }

    /// Number of exchange rounds this strategy runs for `world_size` ranks.
    pub fn rounds(self, world_size: u32) -> u32 {
        match self {
            PersonalizedStrategy::Direct => world_size.saturating_sub(1),
            PersonalizedStrategy::Mesh => crate::topology::ceil_log2(world_size),
        }
    }
}

impl std::fmt::Display for PersonalizedStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PersonalizedStrategy {
    type Err = crate::error::HypercastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "e-cube" | "ecube" => Ok(PersonalizedStrategy::Direct),
            "mesh" | "dimension" => Ok(PersonalizedStrategy::Mesh),
            other => Err(crate::error::HypercastError::InvalidConfig {
                key: "personalized_strategy",
                value: other.to_string(),
            }),
        }
    }
}

/// Collective operations, used for tagging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Operation {
    AllToAllBroadcast = 1,
    AllToAllPersonalized = 2,
    Barrier = 3,
    ReduceMax = 4,
    Exchange = 5,
}

impl Operation {
    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Operation::AllToAllBroadcast => "all_to_all_broadcast",
            Operation::AllToAllPersonalized => "all_to_all_personalized",
            Operation::Barrier => "barrier",
            Operation::ReduceMax => "reduce_max",
            Operation::Exchange => "exchange",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
