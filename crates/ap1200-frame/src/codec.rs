use bytes::{BufMut, Bytes, BytesMut};

use crate::address::{Address, ADDRESS_LEN};
use crate::error::{FrameError, Result};
use crate::flags::Flags;
use crate::packet::Packet;

/// Header: source (8) + dest (8) + port (1) + flags (1) + length (2) = 20 bytes.
pub const HEADER_SIZE: usize = 20;

/// Maximum payload carried by one packet.
pub const MAX_PAYLOAD: usize = 1024;

/// Largest possible frame on the wire.
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD;

pub(crate) const DEST_OFFSET: usize = ADDRESS_LEN;
pub(crate) const PORT_OFFSET: usize = 16;
pub(crate) const FLAGS_OFFSET: usize = 17;
pub(crate) const LENGTH_OFFSET: usize = 18;

/// Write `value` big-endian into `dst`, clamped to what `dst.len()` bytes hold.
///
/// Negative values become 0 and values past the field maximum become the
/// maximum (`2^(8n) - 1`). Nothing wraps and nothing fails.
pub fn clamp_be(value: i64, dst: &mut [u8]) {
    let width = dst.len().min(8);
    let max = match width {
        8 => u64::MAX,
        w => (1u64 << (8 * w)) - 1,
    };
    let clamped = u64::try_from(value).unwrap_or(0).min(max);

    dst.fill(0);
    let start = dst.len() - width;
    dst[start..].copy_from_slice(&clamped.to_be_bytes()[8 - width..]);
}

/// Encode a packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────┬───────┬────────────┬──────────────────┐
/// │ Source   │ Dest     │ Port │ Flags │ Length     │ Payload          │
/// │ (8B)     │ (8B)     │ (1B) │ (1B)  │ (2B BE)    │ (Length bytes)   │
/// └──────────┴──────────┴──────┴───────┴────────────┴──────────────────┘
/// ```
pub fn encode_packet(packet: &Packet, dst: &mut BytesMut) {
    let payload = packet.payload();
    let mut length = [0u8; 2];
    clamp_be(payload.len() as i64, &mut length);

    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(packet.source_address().as_bytes());
    dst.put_slice(packet.dest_address().as_bytes());
    dst.put_u8(packet.port());
    dst.put_u8(packet.flags().bits());
    dst.put_slice(&length);
    dst.put_slice(payload);
}

/// Decode one packet from the start of `src`.
///
/// Bytes past the declared payload are ignored. Use [`Packet::from_wire`] to
/// get the empty-packet fallback instead of an error.
pub fn decode_packet(src: &[u8]) -> Result<Packet> {
    if src.len() < HEADER_SIZE {
        return Err(FrameError::Truncated {
            needed: HEADER_SIZE,
            available: src.len(),
        });
    }

    let payload_len = read_length(src, 0);
    if payload_len > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: MAX_PAYLOAD,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Err(FrameError::Truncated {
            needed: total,
            available: src.len(),
        });
    }

    let source = read_address(src, 0);
    if !source.is_ascii() {
        return Err(FrameError::InvalidAddress { field: "source" });
    }
    let dest = read_address(src, DEST_OFFSET);
    if !dest.is_ascii() {
        return Err(FrameError::InvalidAddress { field: "dest" });
    }

    Ok(Packet::from_parts(
        source,
        dest,
        src[PORT_OFFSET],
        Flags::from_bits(src[FLAGS_OFFSET]),
        Bytes::copy_from_slice(&src[HEADER_SIZE..total]),
    ))
}

/// Payload length declared by the header starting at `base`.
///
/// Caller guarantees `base + HEADER_SIZE <= src.len()`.
pub(crate) fn read_length(src: &[u8], base: usize) -> usize {
    let at = base + LENGTH_OFFSET;
    u16::from_be_bytes([src[at], src[at + 1]]) as usize
}

pub(crate) fn read_address(src: &[u8], offset: usize) -> Address {
    let mut raw = [0u8; ADDRESS_LEN];
    raw.copy_from_slice(&src[offset..offset + ADDRESS_LEN]);
    Address::from_wire(raw)
}
