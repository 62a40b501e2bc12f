use crate::cmd::{Globals, VersionArgs};
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs, globals: &Globals) -> CliResult<i32> {
    if !args.extended {
        println!("streamchan {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: streamchan");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("wire: {}", globals.wire);
    println!("receive_timeout: {:?}", globals.receive_timeout);
    println!("features: async={}, cli=true", cfg!(feature = "async"));

    Ok(SUCCESS)
}
