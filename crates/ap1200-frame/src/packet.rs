use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::address::Address;
use crate::codec::{clamp_be, decode_packet, encode_packet, HEADER_SIZE, MAX_PAYLOAD};
use crate::error::Result;
use crate::flags::{Flag, Flags};
use crate::group::SubPackets;

/// An AP1200 datagram: addressing header plus payload.
///
/// A packet is either valid or *empty*. The empty packet is what a failed
/// decode degrades to: blank addresses, zero port, flags and length, and no
/// payload. Check [`Packet::is_empty`] before trusting a received packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    source: Address,
    dest: Address,
    port: u8,
    flags: Flags,
    payload: Bytes,
    empty: bool,
}

macro_rules! flag_accessors {
    ($($flag:ident => $get:ident, $set:ident;)*) => {
        $(
            #[doc = concat!("Read the ", stringify!($flag), " flag.")]
            pub fn $get(&self) -> bool {
                self.flag(Flag::$flag)
            }

            #[doc = concat!("Set or clear the ", stringify!($flag), " flag.")]
            pub fn $set(&mut self, value: bool) {
                self.set_flag(Flag::$flag, value);
            }
        )*
    };
}

impl Packet {
    /// Create a packet. Payloads longer than 1024 bytes are truncated and
    /// out-of-range ports are clamped to 0-255.
    pub fn new(
        source: &str,
        dest: &str,
        port: impl Into<i64>,
        payload: impl Into<Bytes>,
    ) -> Self {
        let mut packet = Self::from_parts(
            Address::new(source),
            Address::new(dest),
            clamp_port(port.into()),
            Flags::NONE,
            Bytes::new(),
        );
        packet.set_payload(payload);
        packet
    }

    /// The empty packet a failed decode produces.
    pub fn empty() -> Self {
        Self {
            source: Address::BLANK,
            dest: Address::BLANK,
            port: 0,
            flags: Flags::NONE,
            payload: Bytes::new(),
            empty: true,
        }
    }

    /// Assemble a packet from already-validated parts.
    ///
    /// Caller guarantees `payload.len() <= MAX_PAYLOAD`.
    pub(crate) fn from_parts(
        source: Address,
        dest: Address,
        port: u8,
        flags: Flags,
        payload: Bytes,
    ) -> Self {
        debug_assert!(payload.len() <= MAX_PAYLOAD);
        Self {
            source,
            dest,
            port,
            flags,
            payload,
            empty: false,
        }
    }

    /// Decode a packet, reporting why a frame could not be parsed.
    pub fn decode(src: &[u8]) -> Result<Self> {
        decode_packet(src)
    }

    /// Decode a packet, degrading any malformed frame to [`Packet::empty`].
    pub fn from_wire(src: &[u8]) -> Self {
        match decode_packet(src) {
            Ok(packet) => packet,
            Err(err) => {
                debug!(len = src.len(), %err, "malformed frame decoded as empty packet");
                Self::empty()
            }
        }
    }

    /// Encode into a new buffer.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        encode_packet(self, &mut buf);
        buf.freeze()
    }

    /// Append the encoding to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        encode_packet(self, dst);
    }

    /// Total size on the wire (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// True if this is the empty packet produced by a failed decode.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Source identifier without padding.
    pub fn source(&self) -> String {
        self.source.to_trimmed()
    }

    pub fn source_address(&self) -> Address {
        self.source
    }

    pub fn set_source(&mut self, source: &str) {
        self.source = Address::new(source);
        self.empty = false;
    }

    /// Destination identifier without padding.
    pub fn dest(&self) -> String {
        self.dest.to_trimmed()
    }

    pub fn dest_address(&self) -> Address {
        self.dest
    }

    pub fn set_dest(&mut self, dest: &str) {
        self.dest = Address::new(dest);
        self.empty = false;
    }

    pub fn port(&self) -> u8 {
        self.port
    }

    /// Set the port, clamping to 0-255.
    pub fn set_port(&mut self, port: impl Into<i64>) {
        self.port = clamp_port(port.into());
        self.empty = false;
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Replace the whole flag byte.
    pub fn set_flags(&mut self, flags: impl Into<Flags>) {
        self.flags = flags.into();
        self.empty = false;
    }

    /// Read one named flag.
    pub fn flag(&self, flag: Flag) -> bool {
        self.flags.get(flag)
    }

    /// Set one named flag without touching the other seven.
    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        self.flags.set(flag, value);
        self.empty = false;
    }

    flag_accessors! {
        Group => is_group, set_group;
        Checksum => is_checksum, set_checksum;
        Signature => is_signature, set_signature;
        Key => is_key, set_key;
        Encoding => is_encoding, set_encoding;
        Formatting => is_formatting, set_formatting;
        Encryption => is_encryption, set_encryption;
        Subheader => is_subheader, set_subheader;
    }

    /// Payload length, as carried in the header.
    pub fn length(&self) -> usize {
        self.payload.len()
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Replace the payload, truncating to 1024 bytes.
    pub fn set_payload(&mut self, payload: impl Into<Bytes>) {
        let mut payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            debug!(len = payload.len(), max = MAX_PAYLOAD, "truncating payload");
            payload.truncate(MAX_PAYLOAD);
        }
        self.payload = payload;
        self.empty = false;
    }

    /// Iterate the packets grouped in this packet's payload.
    ///
    /// Yields nothing unless the GROUP flag is set. Scanning stops silently
    /// at the first member whose declared length overruns the payload.
    pub fn subpackets(&self) -> SubPackets {
        if self.is_group() {
            SubPackets::new(self.payload.clone())
        } else {
            SubPackets::new(Bytes::new())
        }
    }

    /// Collect [`Packet::subpackets`] in wire order.
    pub fn extract_subpackets(&self) -> Vec<Packet> {
        self.subpackets().collect()
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self::empty()
    }
}

fn clamp_port(port: i64) -> u8 {
    let mut raw = [0u8; 1];
    clamp_be(port, &mut raw);
    raw[0]
}
