//! AP1200 packet framing.
//!
//! Every datagram carries a fixed 20-byte header followed by its payload:
//! - 8-byte source and 8-byte destination identifiers (ASCII, space padded)
//! - 1-byte port and 1-byte flag field
//! - 2-byte big-endian payload length (at most 1024)
//!
//! Decoding is tolerant by design: radio noise produces truncated and garbled
//! frames all the time, so a bad frame degrades to an empty packet instead of
//! an error on the receive path.

pub mod address;
pub mod codec;
pub mod error;
pub mod flags;
pub mod group;
pub mod packet;

pub use address::{Address, ADDRESS_LEN};
pub use codec::{
    clamp_be, decode_packet, encode_packet, HEADER_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use flags::{Flag, Flags};
pub use group::{GroupBuilder, SubPackets};
pub use packet::Packet;
