use ap1200_frame::{HEADER_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("ap1200 {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: ap1200");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("AP1200_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("AP1200_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "wire: header={HEADER_SIZE}B max_payload={MAX_PAYLOAD}B max_frame={MAX_FRAME_SIZE}B"
    );
    println!(
        "features: endpoint={}, cli=true",
        cfg!(feature = "endpoint")
    );

    Ok(SUCCESS)
}
