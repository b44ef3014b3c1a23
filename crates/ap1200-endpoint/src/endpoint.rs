use std::time::{Duration, Instant};

use ap1200_frame::{clamp_be, Address, GroupBuilder, Packet};
use ap1200_transport::{IntegrityTracker, RadioTransport};
use bytes::Bytes;
use tracing::{debug, info, trace};

use crate::config::{EndpointConfig, HeaderFormat};
use crate::error::{EndpointError, Result};

/// A network interface bound to one local address and port.
///
/// Receive path: wait for a transmission, update integrity, decode, then
/// deliver or discard by destination. The endpoint owns its transport
/// exclusively; do not send and receive concurrently on a half-duplex medium.
pub struct NetworkEndpoint<T> {
    address: Address,
    port: u8,
    transport: T,
    tracker: IntegrityTracker,
    config: EndpointConfig,
}

impl<T: RadioTransport> NetworkEndpoint<T> {
    /// Create an endpoint with default configuration.
    pub fn new(address: &str, port: impl Into<i64>, transport: T) -> Self {
        Self::with_config(address, port, transport, EndpointConfig::default())
    }

    /// Create an endpoint with explicit configuration.
    pub fn with_config(
        address: &str,
        port: impl Into<i64>,
        transport: T,
        config: EndpointConfig,
    ) -> Self {
        let mut raw_port = [0u8; 1];
        clamp_be(port.into(), &mut raw_port);
        let address = Address::new(address);
        info!(%address, port = raw_port[0], format = %config.format, "endpoint ready");

        Self {
            address,
            port: raw_port[0],
            transport,
            tracker: IntegrityTracker::new(),
            config,
        }
    }

    /// Local address stamped on outgoing packets.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Local port stamped on outgoing packets.
    pub fn port(&self) -> u8 {
        self.port
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// A packet from this endpoint to `dest`.
    pub fn make_packet(&self, dest: &str, payload: impl Into<Bytes>) -> Packet {
        Packet::new(&self.address.to_trimmed(), dest, self.port, payload)
    }

    /// A GROUP packet from this endpoint to `dest` carrying `members`.
    ///
    /// Only available with [`HeaderFormat::Structured`].
    pub fn make_group(&self, dest: &str, members: &[Packet]) -> Result<Packet> {
        if !self.config.format.supports_grouping() {
            return Err(EndpointError::GroupingUnsupported(self.config.format));
        }

        let mut builder = GroupBuilder::new(&self.address.to_trimmed(), dest, self.port);
        for member in members {
            builder.push(member)?;
        }
        Ok(builder.finish())
    }

    /// Encode and transmit. No acknowledgement, no retry.
    pub fn send(&mut self, packet: &Packet) -> Result<()> {
        debug!(
            dest = %packet.dest_address(),
            port = packet.port(),
            len = packet.length(),
            "sending packet"
        );
        self.transport.transmit(&packet.encode())?;
        Ok(())
    }

    /// Wait for any packet regardless of addressing.
    ///
    /// Returns `Ok(None)` if `timeout` elapses first; `None` waits forever.
    /// A frame that fails to decode is returned as [`Packet::empty`] unless
    /// [`EndpointConfig::discard_malformed`] is set.
    pub fn receive_any(&mut self, timeout: Option<Duration>) -> Result<Option<Packet>> {
        let deadline = deadline_after(timeout);
        debug!("listening for any packet");

        while let Some(packet) = self.catch(deadline)? {
            if packet.is_empty() && self.config.discard_malformed {
                debug!("discarding malformed frame");
                continue;
            }
            debug!(
                dest = %packet.dest_address(),
                port = packet.port(),
                "caught packet"
            );
            return Ok(Some(packet));
        }
        Ok(None)
    }

    /// Wait for a packet addressed to this endpoint's address and port.
    ///
    /// Everything else, including malformed frames, is discarded and the
    /// endpoint keeps listening. Returns `Ok(None)` if `timeout` elapses
    /// first; `None` waits forever.
    pub fn receive(&mut self, timeout: Option<Duration>) -> Result<Option<Packet>> {
        let deadline = deadline_after(timeout);
        debug!(address = %self.address, port = self.port, "listening for addressed packet");

        while let Some(packet) = self.catch(deadline)? {
            if packet.is_empty() {
                debug!("discarding malformed frame");
                continue;
            }
            if !self.is_addressed_to_me(&packet) {
                trace!(
                    dest = %packet.dest_address(),
                    port = packet.port(),
                    "discarding packet for another endpoint"
                );
                continue;
            }
            debug!(source = %packet.source_address(), "received addressed packet");
            return Ok(Some(packet));
        }
        Ok(None)
    }

    /// Packets carried by `packet`: its group members if it is a GROUP packet
    /// under the structured format, otherwise the packet itself.
    pub fn unpack(&self, packet: &Packet) -> Vec<Packet> {
        match self.config.format {
            HeaderFormat::Structured if packet.is_group() => packet.extract_subpackets(),
            _ => vec![packet.clone()],
        }
    }

    /// Integrity of the most recent measured reception (0.0-1.0).
    pub fn integrity(&self) -> f64 {
        self.tracker.integrity()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the endpoint and return its transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn is_addressed_to_me(&self, packet: &Packet) -> bool {
        packet.dest_address() == self.address && packet.port() == self.port
    }

    /// Block until a non-empty reception arrives, then measure and decode it.
    ///
    /// The transport is polled at least once, so a zero timeout still picks
    /// up a frame that is already waiting.
    fn catch(&mut self, deadline: Option<Instant>) -> Result<Option<Packet>> {
        loop {
            let timeout =
                deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()));

            let reception = self.transport.receive(timeout)?;
            if !reception.is_empty() {
                self.tracker.record(&reception.data, reception.bit_errors);
                return Ok(Some(Packet::from_wire(&reception.data)));
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                trace!("receive deadline elapsed");
                return Ok(None);
            }
        }
    }
}

impl<T> std::fmt::Debug for NetworkEndpoint<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkEndpoint")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("integrity", &self.tracker.integrity())
            .field("config", &self.config)
            .finish()
    }
}

fn deadline_after(timeout: Option<Duration>) -> Option<Instant> {
    // Durations too large to add are as good as forever.
    timeout.and_then(|timeout| Instant::now().checked_add(timeout))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::thread;

    use ap1200_frame::{Flag, HEADER_SIZE};
    use ap1200_transport::{LoopbackRadio, Reception, TransportError};

    use super::*;

    const SHORT: Option<Duration> = Some(Duration::from_millis(30));

    /// Plays back scripted receptions, then reports silence.
    #[derive(Default)]
    struct ScriptedRadio {
        script: VecDeque<Reception>,
        sent: Vec<Bytes>,
        fail_receive: bool,
    }

    impl ScriptedRadio {
        fn with(receptions: impl IntoIterator<Item = Reception>) -> Self {
            Self {
                script: receptions.into_iter().collect(),
                ..Self::default()
            }
        }
    }

    impl RadioTransport for ScriptedRadio {
        fn transmit(&mut self, frame: &[u8]) -> ap1200_transport::Result<()> {
            self.sent.push(Bytes::copy_from_slice(frame));
            Ok(())
        }

        fn receive(&mut self, timeout: Option<Duration>) -> ap1200_transport::Result<Reception> {
            if self.fail_receive {
                return Err(TransportError::Shutdown);
            }
            match self.script.pop_front() {
                Some(reception) => Ok(reception),
                None => {
                    let nap = timeout.unwrap_or(Duration::from_millis(1));
                    thread::sleep(nap.min(Duration::from_millis(5)));
                    Ok(Reception::empty())
                }
            }
        }
    }

    fn frame(source: &str, dest: &str, port: i64, payload: &'static [u8]) -> Reception {
        Reception::new(Packet::new(source, dest, port, payload).encode(), 0)
    }

    #[test]
    fn make_packet_stamps_local_address_and_port() {
        let endpoint = NetworkEndpoint::new("NODE1", 5, ScriptedRadio::default());
        let packet = endpoint.make_packet("NODE2", &b"hello"[..]);
        assert_eq!(packet.source(), "NODE1");
        assert_eq!(packet.dest(), "NODE2");
        assert_eq!(packet.port(), 5);
        assert_eq!(packet.flags().bits(), 0);
    }

    #[test]
    fn send_transmits_encoded_frame() {
        let mut endpoint = NetworkEndpoint::new("ALICE", 7, ScriptedRadio::default());
        let packet = endpoint.make_packet("BOB", &b"HI"[..]);
        endpoint.send(&packet).unwrap();

        let sent = &endpoint.transport().sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], packet.encode());
        assert_eq!(sent[0].len(), HEADER_SIZE + 2);
    }

    #[test]
    fn receive_discards_other_addresses_and_ports() {
        let radio = ScriptedRadio::with([
            frame("X", "NODE2", 5, b"not mine"),
            frame("X", "NODE1", 6, b"wrong port"),
            frame("X", "NODE1", 5, b"mine"),
        ]);
        let mut endpoint = NetworkEndpoint::new("NODE1", 5, radio);

        let packet = endpoint.receive(SHORT).unwrap().expect("packet should arrive");
        assert_eq!(packet.payload().as_ref(), b"mine");
        assert!(endpoint.transport().script.is_empty());
    }

    #[test]
    fn receive_times_out_when_nothing_matches() {
        let radio = ScriptedRadio::with([
            frame("X", "NODE2", 5, b"not mine"),
            frame("X", "NODE1", 6, b"wrong port"),
        ]);
        let mut endpoint = NetworkEndpoint::new("NODE1", 5, radio);
        assert!(endpoint.receive(SHORT).unwrap().is_none());
    }

    #[test]
    fn receive_skips_malformed_frames() {
        let radio = ScriptedRadio::with([
            Reception::new(vec![0xAAu8; 7], 0),
            Reception::new(vec![b' '; HEADER_SIZE + 3], 0),
            frame("X", "", 0, b"for blank"),
        ]);
        let mut endpoint = NetworkEndpoint::new("", 0, radio);

        let packet = endpoint.receive(SHORT).unwrap().expect("packet should arrive");
        assert!(!packet.is_empty());
        assert_eq!(packet.payload().as_ref(), b"for blank");
    }

    #[test]
    fn receive_any_returns_first_packet_regardless_of_address() {
        let radio = ScriptedRadio::with([frame("X", "SOMEONE", 99, b"promiscuous")]);
        let mut endpoint = NetworkEndpoint::new("NODE1", 5, radio);

        let packet = endpoint.receive_any(SHORT).unwrap().unwrap();
        assert_eq!(packet.dest(), "SOMEONE");
        assert_eq!(packet.port(), 99);
    }

    #[test]
    fn receive_any_returns_empty_packet_for_garbage() {
        let radio = ScriptedRadio::with([Reception::new(vec![0x01u8; 5], 0)]);
        let mut endpoint = NetworkEndpoint::new("NODE1", 5, radio);

        let packet = endpoint.receive_any(SHORT).unwrap().unwrap();
        assert!(packet.is_empty());
        assert_eq!(packet, Packet::empty());
    }

    #[test]
    fn receive_any_can_discard_garbage() {
        let radio = ScriptedRadio::with([
            Reception::new(vec![0x01u8; 5], 0),
            frame("X", "Y", 1, b"real"),
        ]);
        let config = EndpointConfig {
            discard_malformed: true,
            ..EndpointConfig::default()
        };
        let mut endpoint = NetworkEndpoint::with_config("NODE1", 5, radio, config);

        let packet = endpoint.receive_any(SHORT).unwrap().unwrap();
        assert_eq!(packet.payload().as_ref(), b"real");
    }

    #[test]
    fn silence_times_out() {
        let mut endpoint = NetworkEndpoint::new("NODE1", 5, ScriptedRadio::default());
        let started = Instant::now();
        assert!(endpoint.receive_any(SHORT).unwrap().is_none());
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn transport_failure_is_an_error() {
        let radio = ScriptedRadio {
            fail_receive: true,
            ..ScriptedRadio::default()
        };
        let mut endpoint = NetworkEndpoint::new("NODE1", 5, radio);
        assert!(matches!(
            endpoint.receive(SHORT),
            Err(EndpointError::Transport(TransportError::Shutdown))
        ));
    }

    #[test]
    fn integrity_tracks_latest_measured_reception() {
        let garbled = Reception::new(vec![0u8; 100], 10);
        let noise = Reception::new(vec![0u8; 8], 8);
        let radio = ScriptedRadio::with([garbled, noise]);
        let mut endpoint = NetworkEndpoint::new("NODE1", 5, radio);
        assert_eq!(endpoint.integrity(), 1.0);

        assert!(endpoint.receive_any(SHORT).unwrap().is_some());
        assert!((endpoint.integrity() - 0.90).abs() < 1e-9);

        assert!(endpoint.receive_any(SHORT).unwrap().unwrap().is_empty());
        assert!((endpoint.integrity() - 0.90).abs() < 1e-9);
    }

    #[test]
    fn discarded_packets_still_update_integrity() {
        let mut other = frame("X", "NODE2", 5, &[0u8; 80]);
        other.bit_errors = 50;
        let radio = ScriptedRadio::with([other]);
        let mut endpoint = NetworkEndpoint::new("NODE1", 5, radio);

        assert!(endpoint.receive(SHORT).unwrap().is_none());
        assert!((endpoint.integrity() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn port_is_clamped() {
        let endpoint = NetworkEndpoint::new("NODE1", 300, ScriptedRadio::default());
        assert_eq!(endpoint.port(), 255);
        assert_eq!(endpoint.make_packet("X", Bytes::new()).port(), 255);
    }

    #[test]
    fn structured_endpoint_groups_and_unpacks() {
        let endpoint = NetworkEndpoint::new("HUB", 1, ScriptedRadio::default());
        let a = Packet::new("A", "HUB", 2, &b"one"[..]);
        let b = Packet::new("B", "HUB", 3, &b"two"[..]);

        let group = endpoint.make_group("ALL", &[a.clone(), b.clone()]).unwrap();
        assert!(group.flag(Flag::Group));
        assert_eq!(group.source(), "HUB");
        assert_eq!(endpoint.unpack(&group), vec![a.clone(), b]);
        assert_eq!(endpoint.unpack(&a), vec![a]);
    }

    #[test]
    fn group_overflow_is_reported() {
        let endpoint = NetworkEndpoint::new("HUB", 1, ScriptedRadio::default());
        let big = Packet::new("A", "HUB", 2, vec![0u8; 600]);
        assert!(matches!(
            endpoint.make_group("ALL", &[big.clone(), big]),
            Err(EndpointError::Frame(ap1200_frame::FrameError::GroupFull { .. }))
        ));
    }

    #[test]
    fn legacy_endpoint_treats_flags_as_opaque() {
        let config = EndpointConfig {
            format: HeaderFormat::Legacy,
            ..EndpointConfig::default()
        };
        let endpoint = NetworkEndpoint::with_config("OLD", 1, ScriptedRadio::default(), config);

        let member = Packet::new("A", "OLD", 1, &b"x"[..]);
        assert!(matches!(
            endpoint.make_group("ALL", &[member.clone()]),
            Err(EndpointError::GroupingUnsupported(HeaderFormat::Legacy))
        ));

        let mut looks_grouped = Packet::new("NEW", "OLD", 1, member.encode());
        looks_grouped.set_flags(0xFFu8);
        assert_eq!(endpoint.unpack(&looks_grouped), vec![looks_grouped.clone()]);
    }

    #[test]
    fn zero_timeout_still_polls_queued_frame() {
        let (mut left, right) = LoopbackRadio::pair();
        let mut endpoint = NetworkEndpoint::new("BOB", 7, right);

        left.transmit(&Packet::new("ALICE", "BOB", 7, &b"queued"[..]).encode())
            .unwrap();
        let packet = endpoint
            .receive_any(Some(Duration::ZERO))
            .unwrap()
            .expect("queued frame is returned without waiting");
        assert_eq!(packet.payload().as_ref(), b"queued");

        left.transmit(&Packet::new("ALICE", "BOB", 7, &b"again"[..]).encode())
            .unwrap();
        let packet = endpoint.receive(Some(Duration::ZERO)).unwrap();
        assert_eq!(packet.map(|p| p.payload().clone()), Some(Bytes::from_static(b"again")));

        assert!(endpoint.receive_any(Some(Duration::ZERO)).unwrap().is_none());
    }

    #[test]
    fn endpoints_talk_over_loopback() {
        let (left, mut right) = LoopbackRadio::pair();
        right.set_bit_errors(2);
        let mut alice = NetworkEndpoint::new("ALICE", 7, left);
        let mut bob = NetworkEndpoint::new("BOB", 7, right);

        let listener = thread::spawn(move || {
            let packet = bob.receive(None).unwrap().expect("blocking receive returns a packet");
            (packet, bob.integrity())
        });

        alice.send(&alice.make_packet("CAROL", &b"not for bob"[..])).unwrap();
        let packet = alice.make_packet("BOB", vec![b'x'; 20]);
        alice.send(&packet).unwrap();

        let (received, integrity) = listener.join().unwrap();
        assert_eq!(received, packet);
        assert!((integrity - (1.0 - 2.0 / 40.0)).abs() < 1e-9);
    }
}
