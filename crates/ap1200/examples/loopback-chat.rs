//! Two stations exchanging packets over an in-memory radio link.
//!
//! Run with:
//!   cargo run --example loopback-chat
//!
//! ALICE sends a plain packet and then a group to BOB on port 7. BOB's
//! receiver reports a few bit errors per frame, so its integrity estimate
//! drops below 100%.

use std::thread;
use std::time::Duration;

use ap1200::endpoint::NetworkEndpoint;
use ap1200::transport::LoopbackRadio;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (alice_radio, mut bob_radio) = LoopbackRadio::pair();
    bob_radio.set_bit_errors(3);

    let bob = thread::spawn(move || -> Result<(), ap1200::endpoint::EndpointError> {
        let mut bob = NetworkEndpoint::new("BOB", 7, bob_radio);
        for _ in 0..2 {
            let Some(packet) = bob.receive(Some(Duration::from_secs(2)))? else {
                eprintln!("BOB: nothing heard");
                break;
            };
            eprintln!(
                "BOB: {} bytes from {} (integrity {:.2}%)",
                packet.length(),
                packet.source(),
                bob.integrity() * 100.0
            );
            for member in bob.unpack(&packet) {
                eprintln!("  -> {}", String::from_utf8_lossy(member.payload()));
            }
        }
        Ok(())
    });

    let mut alice = NetworkEndpoint::new("ALICE", 7, alice_radio);
    let hello = alice.make_packet("BOB", "hello, bob");
    alice.send(&hello)?;

    let members = [
        alice.make_packet("BOB", "first"),
        alice.make_packet("BOB", "second"),
        alice.make_packet("BOB", "third"),
    ];
    let group = alice.make_group("BOB", &members)?;
    alice.send(&group)?;

    match bob.join() {
        Ok(result) => result?,
        Err(_) => return Err("receiver thread panicked".into()),
    }
    Ok(())
}
