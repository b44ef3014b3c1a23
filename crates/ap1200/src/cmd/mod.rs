use std::path::PathBuf;
use std::time::Duration;

use ap1200_endpoint::HeaderFormat;
use ap1200_frame::{Flag, Flags, Packet};
use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod listen;
pub mod send;
pub mod version;

/// Medium directory used when neither `--medium` nor `AP1200_MEDIUM` is set.
pub const DEFAULT_MEDIUM: &str = "/tmp/ap1200-air";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build and transmit one packet.
    Send(SendArgs),
    /// Listen and print received packets.
    Listen(ListenArgs),
    /// Decode a captured frame offline.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Header flavor selectable on the command line.
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum FormatArg {
    #[default]
    Structured,
    Legacy,
}

impl From<FormatArg> for HeaderFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Structured => HeaderFormat::Structured,
            FormatArg::Legacy => HeaderFormat::Legacy,
        }
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Destination address.
    pub dest: String,
    /// Source address of this station.
    #[arg(long, env = "AP1200_ADDRESS")]
    pub from: String,
    /// Port to send on.
    #[arg(long, short = 'p', env = "AP1200_PORT", default_value = "0")]
    pub port: u8,
    /// Medium directory shared by all stations.
    #[arg(long, env = "AP1200_MEDIUM", default_value = DEFAULT_MEDIUM)]
    pub medium: PathBuf,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["file", "member"])]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "member"])]
    pub file: Option<PathBuf>,
    /// Send a GROUP packet with one member per occurrence.
    #[arg(long, conflicts_with_all = ["data", "file", "flags_byte"])]
    pub member: Vec<String>,
    /// Set a named flag (repeatable), e.g. checksum, encryption.
    #[arg(long = "flag", value_name = "NAME", value_parser = parse_flag)]
    pub flags: Vec<Flag>,
    /// Set the whole flag byte as 8 bits, e.g. 01000000.
    #[arg(long, value_name = "BITS", value_parser = parse_flags_byte, conflicts_with = "flags")]
    pub flags_byte: Option<Flags>,
    /// Header format.
    #[arg(long, value_enum, default_value_t = FormatArg::Structured)]
    pub header_format: FormatArg,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Only accept packets for this address. Omit to hear everything.
    #[arg(long)]
    pub address: Option<String>,
    /// Only accept packets on this port (requires --address). Default: 0.
    #[arg(long, requires = "address")]
    pub port: Option<u8>,
    /// Medium directory shared by all stations.
    #[arg(long, env = "AP1200_MEDIUM", default_value = DEFAULT_MEDIUM)]
    pub medium: PathBuf,
    /// Exit after receiving N packets.
    #[arg(long)]
    pub count: Option<usize>,
    /// Give up after this long without reaching --count (e.g. 5s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
    /// Header format.
    #[arg(long, value_enum, default_value_t = FormatArg::Structured)]
    pub header_format: FormatArg,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub hex: Option<String>,
    /// Read raw frame bytes from file.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Header format.
    #[arg(long, value_enum, default_value_t = FormatArg::Structured)]
    pub header_format: FormatArg,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_flag(name: &str) -> Result<Flag, String> {
    Flag::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = Flag::ALL.iter().map(|flag| flag.name()).collect();
        format!("unknown flag '{name}' (expected one of {})", known.join(", "))
    })
}

fn parse_flags_byte(bits: &str) -> Result<Flags, String> {
    Flags::from_bit_str(bits).ok_or_else(|| format!("'{bits}' is not 8 binary digits"))
}

/// Parse durations like `5s`, `250ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Members to display for `packet`: its grouped packets when the header
/// format gives GROUP a meaning, otherwise none.
pub fn group_members(format: HeaderFormat, packet: &Packet) -> Vec<Packet> {
    if format.supports_grouping() && packet.is_group() {
        packet.extract_subpackets()
    } else {
        Vec::new()
    }
}

/// Socket label for a station on the medium: its address plus our pid, so
/// several processes can share an address.
pub fn station_label(address: &str) -> String {
    let mut label: String = address
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if label.is_empty() {
        label.push_str("any");
    }
    format!("{label}-{}", std::process::id())
}
