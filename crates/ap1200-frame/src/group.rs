//! Grouped packets.
//!
//! A GROUP packet's payload is a tight concatenation of encoded member
//! packets, each with the same 20-byte header. Members do not need the
//! GROUP flag themselves, and a member may itself be a group.

use std::iter::FusedIterator;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::codec::{
    read_address, read_length, DEST_OFFSET, FLAGS_OFFSET, HEADER_SIZE, MAX_PAYLOAD, PORT_OFFSET,
};
use crate::error::{FrameError, Result};
use crate::flags::Flags;
use crate::packet::Packet;

/// Iterator over the members of a group payload, in wire order.
///
/// Members are never rejected: non-ASCII address bytes are replaced with
/// `?`, so an extracted member re-encodes to a frame that decodes cleanly.
/// The scan ends when fewer than 20 bytes remain or when a
/// member's declared length runs past the end of the payload; the
/// remainder is dropped without error.
#[derive(Debug, Clone)]
pub struct SubPackets {
    payload: Bytes,
    offset: usize,
}

impl SubPackets {
    pub(crate) fn new(payload: Bytes) -> Self {
        Self { payload, offset: 0 }
    }
}

impl Iterator for SubPackets {
    type Item = Packet;

    fn next(&mut self) -> Option<Packet> {
        let base = self.offset;
        if self.payload.len().saturating_sub(base) < HEADER_SIZE {
            return None;
        }

        let len = read_length(&self.payload, base);
        let end = base + HEADER_SIZE + len;
        if end > self.payload.len() {
            debug!(
                offset = base,
                declared = len,
                available = self.payload.len() - base - HEADER_SIZE,
                "grouped packet overruns group payload; dropping remainder"
            );
            self.offset = self.payload.len();
            return None;
        }

        trace!(offset = base, len, "reading grouped packet");
        let packet = Packet::from_parts(
            read_address(&self.payload, base).ascii_lossy(),
            read_address(&self.payload, base + DEST_OFFSET).ascii_lossy(),
            self.payload[base + PORT_OFFSET],
            Flags::from_bits(self.payload[base + FLAGS_OFFSET]),
            self.payload.slice(base + HEADER_SIZE..end),
        );
        self.offset = end;
        Some(packet)
    }
}

impl FusedIterator for SubPackets {}

/// Packs member packets into a GROUP packet.
#[derive(Debug, Clone)]
pub struct GroupBuilder {
    outer: Packet,
    buf: BytesMut,
    members: usize,
}

impl GroupBuilder {
    /// Start a group addressed from `source` to `dest` on `port`.
    pub fn new(source: &str, dest: &str, port: impl Into<i64>) -> Self {
        Self {
            outer: Packet::new(source, dest, port, Bytes::new()),
            buf: BytesMut::with_capacity(MAX_PAYLOAD),
            members: 0,
        }
    }

    /// Append a member. Fails without changing the group if the member's
    /// encoding would push the payload past 1024 bytes.
    pub fn push(&mut self, member: &Packet) -> Result<()> {
        let needed = member.wire_size();
        if self.buf.len() + needed > MAX_PAYLOAD {
            return Err(FrameError::GroupFull {
                used: self.buf.len(),
                needed,
                max: MAX_PAYLOAD,
            });
        }
        member.encode_into(&mut self.buf);
        self.members += 1;
        Ok(())
    }

    /// Builder-style [`GroupBuilder::push`].
    pub fn with(mut self, member: &Packet) -> Result<Self> {
        self.push(member)?;
        Ok(self)
    }

    /// Number of members pushed so far.
    pub fn len(&self) -> usize {
        self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members == 0
    }

    /// Payload bytes still free.
    pub fn remaining(&self) -> usize {
        MAX_PAYLOAD - self.buf.len()
    }

    /// Finish the group: the payload is the concatenated members and the
    /// GROUP flag is set.
    pub fn finish(self) -> Packet {
        let mut outer = self.outer;
        outer.set_payload(self.buf.freeze());
        outer.set_group(true);
        outer
    }
}
