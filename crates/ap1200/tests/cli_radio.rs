#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use ap1200_endpoint::NetworkEndpoint;
use ap1200_frame::{Flag, Packet};
use ap1200_transport::DatagramRadio;

fn unique_medium(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/ap1200cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("medium dir should be creatable");
    dir
}

fn wait_for_station(medium: &Path, timeout: Duration) {
    let start = Instant::now();
    loop {
        let joined = std::fs::read_dir(medium)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .any(|entry| entry.path().extension().is_some_and(|ext| ext == "sock"))
            })
            .unwrap_or(false);
        if joined {
            return;
        }
        assert!(
            start.elapsed() < timeout,
            "listener never joined {}",
            medium.display()
        );
        thread::sleep(Duration::from_millis(25));
    }
}

fn ap1200() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ap1200"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("stdout line should be JSON"))
        .collect()
}

#[test]
fn listen_prints_packet_addressed_to_it() {
    let medium = unique_medium("listen");

    let child = ap1200()
        .args(["--format", "json", "listen", "--address", "BOB", "--port", "7"])
        .args(["--count", "1", "--timeout", "5s"])
        .arg("--medium")
        .arg(&medium)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("listen command should start");

    wait_for_station(&medium, Duration::from_secs(3));

    let radio = DatagramRadio::join(&medium, "sender").expect("sender should join");
    let mut alice = NetworkEndpoint::new("ALICE", 7, radio);
    let stray = alice.make_packet("CAROL", "not for bob");
    let wanted = alice.make_packet("BOB", "hello bob");
    alice.send(&stray).expect("send should succeed");
    alice.send(&wanted).expect("send should succeed");

    let output = child.wait_with_output().expect("listen should exit");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let packets = json_lines(&output);
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0]["source"], "ALICE");
    assert_eq!(packets[0]["dest"], "BOB");
    assert_eq!(packets[0]["port"], 7);
    assert_eq!(packets[0]["payload"], "hello bob");
    assert_eq!(packets[0]["integrity"], 1.0);

    let _ = std::fs::remove_dir_all(&medium);
}

#[test]
fn send_command_reaches_library_endpoint() {
    let medium = unique_medium("send");
    let radio = DatagramRadio::join(&medium, "bob").expect("receiver should join");
    let mut bob = NetworkEndpoint::new("BOB", 9, radio);

    let output = ap1200()
        .args(["--format", "json", "send", "BOB", "--from", "ALICE", "--port", "9"])
        .args(["--member", "first", "--member", "second"])
        .arg("--medium")
        .arg(&medium)
        .output()
        .expect("send command should run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let packet = bob
        .receive(Some(Duration::from_secs(3)))
        .expect("receive should not fail")
        .expect("group packet should arrive");
    assert!(packet.is_group());
    let payloads: Vec<Vec<u8>> = bob
        .unpack(&packet)
        .iter()
        .map(|member| member.payload().to_vec())
        .collect();
    assert_eq!(payloads, vec![b"first".to_vec(), b"second".to_vec()]);

    let _ = std::fs::remove_dir_all(&medium);
}

#[test]
fn listen_times_out_with_exit_124() {
    let medium = unique_medium("timeout");

    let output = ap1200()
        .args(["listen", "--address", "BOB", "--count", "1", "--timeout", "300ms"])
        .arg("--medium")
        .arg(&medium)
        .output()
        .expect("listen command should run");

    assert_eq!(output.status.code(), Some(124));
    assert!(String::from_utf8_lossy(&output.stderr).contains("timed out"));

    let _ = std::fs::remove_dir_all(&medium);
}

#[test]
fn decode_hex_emits_json_with_flags() {
    let mut packet = Packet::new("ALICE", "BOB", 7, "hi");
    packet.set_flag(Flag::Checksum, true);
    let wire = hex::encode(packet.encode());

    let output = ap1200()
        .args(["--format", "json", "decode", "--hex", &wire])
        .output()
        .expect("decode command should run");
    assert!(output.status.success());

    let decoded = json_lines(&output);
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0]["source"], "ALICE");
    assert_eq!(decoded[0]["flags"], "01000000");
    assert_eq!(decoded[0]["flag_names"][0], "CHECKSUM");
    assert_eq!(decoded[0]["length"], 2);
    assert_eq!(decoded[0]["payload"], "hi");
}

#[test]
fn decode_rejects_truncated_frame() {
    let output = ap1200()
        .args(["decode", "--hex", "414c494345"])
        .output()
        .expect("decode command should run");

    assert_eq!(output.status.code(), Some(60));
}
