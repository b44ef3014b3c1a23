use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use ap1200_frame::Packet;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Integrity below this is flagged as likely carrying uncorrected errors.
pub const LOW_INTEGRITY: f64 = 0.70;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput {
    source: String,
    dest: String,
    port: u8,
    flags: String,
    flag_names: Vec<&'static str>,
    length: usize,
    payload: String,
    empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    integrity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    members: Vec<PacketOutput>,
}

impl PacketOutput {
    fn from_packet(packet: &Packet, members: &[Packet]) -> Self {
        Self {
            source: packet.source(),
            dest: packet.dest(),
            port: packet.port(),
            flags: packet.flags().to_string(),
            flag_names: packet.flags().iter().map(|flag| flag.name()).collect(),
            length: packet.length(),
            payload: payload_preview(packet.payload()),
            empty: packet.is_empty(),
            integrity: None,
            timestamp: None,
            members: members
                .iter()
                .map(|member| Self::from_packet(member, &[]))
                .collect(),
        }
    }
}

/// Print one packet, its group members (if any) and the reception integrity.
pub fn print_packet(
    packet: &Packet,
    members: &[Packet],
    integrity: Option<f64>,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let mut out = PacketOutput::from_packet(packet, members);
            out.integrity = integrity.map(round_percent_fraction);
            out.timestamp = Some(now_unix_seconds());
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["", "SOURCE", "DEST", "PORT", "FLAGS", "LEN", "PAYLOAD"]);
            table.add_row(table_row("packet", packet));
            for member in members {
                table.add_row(table_row("member", member));
            }
            println!("{table}");
            if let Some(integrity) = integrity {
                println!("integrity: {}", percent(integrity));
            }
        }
        OutputFormat::Pretty => {
            if let Some(integrity) = integrity {
                println!("Packet received (integrity: {})", percent(integrity));
                if integrity < LOW_INTEGRITY {
                    println!("WARNING: low packet integrity, uncorrected errors may be present");
                }
            }
            if packet.is_empty() {
                println!("<empty packet: frame could not be decoded>");
                return;
            }
            println!("{}", summary_line(packet));
            if members.is_empty() {
                println!("{}", payload_preview(packet.payload()));
            } else {
                println!("group of {} packets:", members.len());
                for member in members {
                    println!("  {}", summary_line(member));
                    println!("  {}", payload_preview(member.payload()));
                }
            }
        }
        OutputFormat::Raw => {
            print_raw(packet.payload());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn table_row(kind: &str, packet: &Packet) -> Vec<String> {
    vec![
        kind.to_string(),
        packet.source(),
        packet.dest(),
        packet.port().to_string(),
        packet.flags().to_string(),
        packet.length().to_string(),
        payload_preview(packet.payload()),
    ]
}

fn summary_line(packet: &Packet) -> String {
    format!(
        "{} -> {} ({}) [F: {}, L: {}]",
        packet.source(),
        packet.dest(),
        packet.port(),
        packet.flags(),
        packet.length()
    )
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn percent(integrity: f64) -> String {
    format!("{:.2}%", integrity * 100.0)
}

fn round_percent_fraction(integrity: f64) -> f64 {
    (integrity * 10_000.0).round() / 10_000.0
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
