use crate::error::{HypercastError, Result};
use crate::types::{CubeId, Operation};

/// Size of the exchange frame header in bytes.
pub const FRAME_HEADER_SIZE: usize = 16;

/// 16-byte header prepended to every collective exchange payload.
///
/// Carries the sender's view of the exchange so the receiver can verify
/// that both sides computed the same hypercube.
///
/// ```text
/// [0]      operation: u8
/// [1]      reserved: u8 (must be 0)
/// [2..4]   round: u16 LE
/// [4..8]   world_size: u32 LE
/// [8..12]  from: u32 LE (sender's hypercube id)
/// [12..16] to: u32 LE   (receiver's hypercube id)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub operation: Operation,
    pub round: u16,
    pub world_size: u32,
    pub from: CubeId,
    pub to: CubeId,
}

impl FrameHeader {
    /// Encode header to 16 bytes (little-endian).
    pub fn encode(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut buf = [0u8; FRAME_HEADER_SIZE];
        buf[0] = self.operation as u8;
        // buf[1] reserved = 0
        buf[2..4].copy_from_slice(&self.round.to_le_bytes());
        buf[4..8].copy_from_slice(&self.world_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.from.to_le_bytes());
        buf[12..16].copy_from_slice(&self.to.to_le_bytes());
        buf
    }

    /// Decode header from the front of a frame.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Err(HypercastError::DecodeFailed(format!(
                "frame of {} bytes is shorter than its header",
                buf.len()
            )));
        }
        let operation = operation_from_u8(buf[0]).ok_or_else(|| {
            HypercastError::DecodeFailed(format!("unknown operation byte {}", buf[0]))
        })?;
        let word =
            |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        Ok(FrameHeader {
            operation,
            round: u16::from_le_bytes([buf[2], buf[3]]),
            world_size: word(4),
            from: word(8),
            to: word(12),
        })
    }

    /// Build a frame: header followed by `payload`.
    pub fn frame(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        out.extend_from_slice(&self.encode());
        out.extend_from_slice(payload);
        out
    }

    /// Split a frame into its header and payload.
    pub fn split(frame: &[u8]) -> Result<(Self, &[u8])> {
        let header = Self::decode(frame)?;
        Ok((header, &frame[FRAME_HEADER_SIZE..]))
    }

    /// Check a received header against what this side expected to receive.
    ///
    /// A mismatch means the two ranks disagree about the world or the
    /// hypercube placement, which no retry can fix.
    pub fn verify(&self, expected: &FrameHeader) -> Result<()> {
        if self == expected {
            return Ok(());
        }
        Err(HypercastError::TopologyInvariant {
            operation: expected.operation.name(),
            detail: format!(
                "expected {} -> {} (round {}, world {}), peer sent {} -> {} (round {}, world {}, {})",
                expected.from,
                expected.to,
                expected.round,
                expected.world_size,
                self.from,
                self.to,
                self.round,
                self.world_size,
                self.operation,
            ),
        })
    }
}

fn operation_from_u8(v: u8) -> Option<Operation> {
    match v {
        1 => Some(Operation::AllToAllBroadcast),
        2 => Some(Operation::AllToAllPersonalized),
        3 => Some(Operation::Barrier),
        4 => Some(Operation::ReduceMax),
        5 => Some(Operation::Exchange),
        _ => None,
    }
}
