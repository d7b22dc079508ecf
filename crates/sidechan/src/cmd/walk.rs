use tracing::info;

use crate::cmd::WalkArgs;
use crate::exit::{side_channel_error, CliResult, SUCCESS};
use crate::output::{print_values, OutputFormat};

pub fn run(args: WalkArgs, format: OutputFormat) -> CliResult<i32> {
    let mut side = args.channel.open()?;

    let values = side
        .snmp_walk(&args.oid)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| side_channel_error("walk failed", err))?;
    info!(scope = %args.oid, count = values.len(), "walk complete");

    print_values(&values, format);
    Ok(SUCCESS)
}
