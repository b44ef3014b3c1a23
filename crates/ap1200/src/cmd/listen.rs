use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ap1200_endpoint::{EndpointConfig, NetworkEndpoint};
use ap1200_transport::DatagramRadio;
use tracing::{info, warn};

use crate::cmd::{group_members, parse_duration, station_label, ListenArgs};
use crate::exit::{
    endpoint_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS, TIMEOUT,
};
use crate::output::{print_packet, OutputFormat, LOW_INTEGRITY};

/// Longest single wait on the medium, so Ctrl-C is noticed promptly.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Port used by a promiscuous listener; it never filters on it.
const ANY_PORT: u8 = 255;

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let deadline = match &args.timeout {
        Some(timeout) => Some(Instant::now() + parse_duration(timeout)?),
        None => None,
    };
    let filtered = args.address.is_some();
    let (address, port) = match &args.address {
        Some(address) => (address.clone(), args.port.unwrap_or(0)),
        None => (String::new(), ANY_PORT),
    };

    let radio = DatagramRadio::join(&args.medium, &station_label(&address))
        .map_err(|err| transport_error("join medium failed", err))?;
    let config = EndpointConfig {
        format: args.header_format.into(),
        ..EndpointConfig::default()
    };
    let mut endpoint = NetworkEndpoint::with_config(&address, port, radio, config);
    info!(medium = ?args.medium, filtered, "listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let wait = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return timed_out(printed, args.count);
                }
                remaining.min(POLL_INTERVAL)
            }
            None => POLL_INTERVAL,
        };

        let received = if filtered {
            endpoint.receive(Some(wait))
        } else {
            endpoint.receive_any(Some(wait))
        }
        .map_err(|err| endpoint_error("receive failed", err))?;
        let Some(packet) = received else {
            continue;
        };

        let integrity = endpoint.integrity();
        if integrity < LOW_INTEGRITY {
            warn!(integrity, "low packet integrity");
        }
        let members = group_members(endpoint.config().format, &packet);
        print_packet(&packet, &members, Some(integrity), format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}

fn timed_out(printed: usize, count: Option<usize>) -> CliResult<i32> {
    match count {
        Some(count) if printed < count => Err(CliError::new(
            TIMEOUT,
            format!("timed out after receiving {printed} of {count} packets"),
        )),
        _ => Ok(SUCCESS),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
