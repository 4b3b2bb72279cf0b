//! Hypercube addressing and virtual-rank placement.
//!
//! A world of `N` ranks is embedded in a hypercube of dimension
//! `d = ceil_log2(N)`. When `N` is not a power of two the ids `N..2^d` have
//! no process behind them; each is emulated by the physical rank obtained by
//! clearing its top bit. Every rank derives the same placement from `N`
//! alone, so nothing about it is ever exchanged.

use crate::types::{CubeId, Rank};

/// True iff `n` is a positive power of two.
pub const fn is_power_of_two(n: u32) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Integer ceiling of log2(n). Returns 0 for n <= 1.
pub const fn ceil_log2(n: u32) -> u32 {
    if n <= 1 {
        return 0;
    }
    // For n > 1: ceil(log2(n)) = 32 - (n-1).leading_zeros()
    u32::BITS - (n - 1).leading_zeros()
}

/// Neighbour of `id` along hypercube dimension `round`.
pub const fn partner(id: CubeId, round: u32) -> CubeId {
    id ^ (1 << round)
}

/// Which identity a buffer belongs to during a hypercube collective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Participant {
    /// A real rank, acting for itself.
    Physical(Rank),
    /// A padded id emulated by its host.
    Virtual(CubeId),
}

impl Participant {
    /// Position of this participant in the hypercube.
    pub const fn id(self) -> CubeId {
        match self {
            Participant::Physical(r) => r,
            Participant::Virtual(v) => v,
        }
    }

    pub const fn is_virtual(self) -> bool {
        matches!(self, Participant::Virtual(_))
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Participant::Physical(r) => write!(f, "rank {r}"),
            Participant::Virtual(v) => write!(f, "virtual {v}"),
        }
    }
}

/// Per-call view of the hypercube from one physical rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HypercubeLayout {
    rank: Rank,
    world_size: u32,
    dimension: u32,
    hosted: Option<CubeId>,
}

impl HypercubeLayout {
    /// Compute the layout for `rank` in a world of `world_size` ranks.
    ///
    /// Callers validate `rank < world_size` beforehand.
    pub fn new(rank: Rank, world_size: u32) -> Self {
        debug_assert!(rank < world_size, "rank {rank} outside world {world_size}");
        let dimension = ceil_log2(world_size);
        let hosted = hosted_virtual(rank, world_size, dimension);
        Self {
            rank,
            world_size,
            dimension,
            hosted,
        }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn world_size(&self) -> u32 {
        self.world_size
    }

    /// Number of exchange rounds, `ceil_log2(world_size)`.
    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// `2^dimension`: physical plus virtual ids.
    pub fn padded_size(&self) -> u32 {
        1 << self.dimension
    }

    /// `2^(dimension-1)`, or 0 for a single-rank world.
    pub fn half(&self) -> u32 {
        if self.dimension == 0 {
            0
        } else {
            1 << (self.dimension - 1)
        }
    }

    /// Virtual id hosted by this rank, if any.
    pub fn hosted_virtual(&self) -> Option<CubeId> {
        self.hosted
    }

    /// True when `id` names a real rank.
    pub fn is_physical(&self, id: CubeId) -> bool {
        id < self.world_size
    }

    /// Physical rank that holds the buffer for hypercube id `id`.
    pub fn host_of(&self, id: CubeId) -> Rank {
        if self.is_physical(id) {
            id
        } else {
            id ^ self.half()
        }
    }

    /// The identities this rank plays, physical first.
    pub fn participants(&self) -> impl Iterator<Item = Participant> + '_ {
        std::iter::once(Participant::Physical(self.rank))
            .chain(self.hosted.map(Participant::Virtual))
    }

    /// All `(virtual, host)` pairs of the world, in ascending virtual id.
    pub fn virtual_ranks(&self) -> impl Iterator<Item = (CubeId, Rank)> + '_ {
        (self.world_size..self.padded_size()).map(|v| (v, self.host_of(v)))
    }
}

fn hosted_virtual(rank: Rank, world_size: u32, dimension: u32) -> Option<CubeId> {
    if is_power_of_two(world_size) || dimension == 0 {
        return None;
    }
    let half = 1 << (dimension - 1);
    // Rank 0 is the anchor: its mirror `half` is always a real rank.
    if rank == 0 || rank >= half {
        return None;
    }
    let vid = rank ^ half;
    (vid >= world_size).then_some(vid)
}
