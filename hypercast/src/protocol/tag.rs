use crate::types::Operation;

/// Which of the sender's identities a frame comes from.
///
/// A host may talk to the same physical peer twice in one round, once for
/// itself and once for the virtual rank it emulates; the lane keeps the two
/// streams apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Lane {
    Physical = 0,
    Virtual = 1,
}

/// Tag bit set on every caller-chosen `exchange_with` tag and never on a
/// collective tag, so the two cannot collide.
pub const USER_TAG_BIT: u64 = 1 << 63;

/// Compose a transport tag for one exchange.
///
/// ```text
/// [63]     0 (see USER_TAG_BIT)
/// [62..32] epoch   (per-client call counter, starts at 1, wraps at 2^31)
/// [31..24] operation
/// [23..16] lane of the sender
/// [15..0]  round
/// ```
///
/// Tag 0 is never produced, since epochs start at 1.
pub fn exchange_tag(epoch: u32, operation: Operation, lane: Lane, round: u32) -> u64 {
    (((epoch & 0x7FFF_FFFF) as u64) << 32)
        | ((operation as u64) << 24)
        | ((lane as u64) << 16)
        | (round as u64 & 0xFFFF)
}
