//! MessagePack wire codec: the envelope framing, typed payloads, and the
//! size-threshold compressor sitting above the UDP transport (spec 4.1).

mod codec;
mod messages;

pub use codec::{Envelope, decode_datagram, encode_datagram};
pub use messages::{
    AbilityTarget, ClientMessage, PlayerInput, PlayerStateUpdate, ServerMessage, Vector2,
};

pub const PROTOCOL_VERSION: u32 = 1;
pub const DEFAULT_PORT: u16 = 7001;
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Sequence-wraparound-safe comparison, ported from the teacher's ack
/// bitfield arithmetic for use by both the reliability overlay and the
/// per-player input buffer.
#[inline]
pub fn sequence_greater_than(a: u32, b: u32) -> bool {
    const WRAP: u32 = u32::MAX / 2;
    ((a > b) && (a - b <= WRAP)) || ((a < b) && (b - a > WRAP))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_comparison_handles_wraparound() {
        assert!(sequence_greater_than(2, 1));
        assert!(!sequence_greater_than(1, 2));
        assert!(sequence_greater_than(0, u32::MAX));
        assert!(!sequence_greater_than(u32::MAX, 0));
    }
}
