use std::fs;

use ap1200_endpoint::HeaderFormat;
use ap1200_frame::Packet;

use crate::cmd::{group_members, DecodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = read_frame(&args)?;
    let packet = Packet::decode(&wire).map_err(|err| frame_error("decode failed", err))?;
    let members = group_members(HeaderFormat::from(args.header_format), &packet);
    print_packet(&packet, &members, None, format);
    Ok(SUCCESS)
}

fn read_frame(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(text) = &args.hex {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        return hex::decode(compact)
            .map_err(|err| CliError::new(USAGE, format!("--hex is not valid hex: {err}")));
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Err(CliError::new(USAGE, "one of --hex or --file is required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::FormatArg;

    fn hex_args(hex: &str) -> DecodeArgs {
        DecodeArgs {
            hex: Some(hex.to_string()),
            file: None,
            header_format: FormatArg::Structured,
        }
    }

    #[test]
    fn reads_spaced_hex() {
        let frame = read_frame(&hex_args("41 4C 49 43\n45")).unwrap();
        assert_eq!(frame, b"ALICE");
    }

    #[test]
    fn invalid_hex_is_usage_error() {
        let err = read_frame(&hex_args("zz")).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn truncated_frame_is_data_invalid() {
        let err = run(hex_args("4142"), OutputFormat::Json).unwrap_err();
        assert_eq!(err.code, crate::exit::DATA_INVALID);
    }
}
