use std::fs;

use ap1200_endpoint::{EndpointConfig, NetworkEndpoint};
use ap1200_frame::{Flags, Packet, MAX_PAYLOAD};
use ap1200_transport::DatagramRadio;
use tracing::{info, warn};

use crate::cmd::{group_members, station_label, SendArgs};
use crate::exit::{endpoint_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let radio = DatagramRadio::join(&args.medium, &station_label(&args.from))
        .map_err(|err| transport_error("join medium failed", err))?;
    let config = EndpointConfig {
        format: args.header_format.into(),
        ..EndpointConfig::default()
    };
    let mut endpoint = NetworkEndpoint::with_config(&args.from, args.port, radio, config);

    let packet = build_packet(&endpoint, &args)?;
    endpoint
        .send(&packet)
        .map_err(|err| endpoint_error("send failed", err))?;
    info!(dest = %packet.dest(), len = packet.length(), "packet transmitted");

    let members = group_members(endpoint.config().format, &packet);
    print_packet(&packet, &members, None, format);
    Ok(SUCCESS)
}

fn build_packet<T: ap1200_transport::RadioTransport>(
    endpoint: &NetworkEndpoint<T>,
    args: &SendArgs,
) -> CliResult<Packet> {
    if !args.member.is_empty() {
        let members: Vec<Packet> = args
            .member
            .iter()
            .map(|text| endpoint.make_packet(&args.dest, text.as_bytes().to_vec()))
            .collect();
        let mut group = endpoint
            .make_group(&args.dest, &members)
            .map_err(|err| endpoint_error("group failed", err))?;
        apply_flags(&mut group, args);
        return Ok(group);
    }

    let payload = resolve_payload(args)?;
    if payload.len() > MAX_PAYLOAD {
        warn!(
            len = payload.len(),
            max = MAX_PAYLOAD,
            "payload will be truncated"
        );
    }
    let mut packet = endpoint.make_packet(&args.dest, payload);
    apply_flags(&mut packet, args);
    Ok(packet)
}

fn apply_flags(packet: &mut Packet, args: &SendArgs) {
    if let Some(byte) = args.flags_byte {
        packet.set_flags(byte);
        return;
    }
    let mut flags: Flags = packet.flags();
    for flag in &args.flags {
        flags.set(*flag, true);
    }
    packet.set_flags(flags);
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}
