use sidechan_peer::{Emulator, SideChannel, SideChannelConfig};
use tracing::info;

use crate::cmd::{open_descriptor, EmulateArgs};
use crate::exit::{mib_error, side_channel_error, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat, Report};

pub fn run(args: EmulateArgs, format: OutputFormat) -> CliResult<i32> {
    let mut emulator = Emulator::from_path(&args.config)
        .map_err(|err| mib_error("failed loading device description", err))?;
    let channel = open_descriptor(args.fd)?;
    let mut side = SideChannel::from_channel(channel, SideChannelConfig::default());

    info!(
        fd = args.fd,
        oids = emulator.mib().len(),
        "emulating backend"
    );
    let answered = side
        .serve(&mut emulator)
        .map_err(|err| side_channel_error("serve failed", err))?;
    info!(answered, "peer closed side channel");

    let report = Report {
        operation: "emulate",
        status: "ok",
        size: Some(answered),
        ..Report::default()
    };
    print_report(&report, format);
    Ok(SUCCESS)
}
