use sidechan_peer::SnmpValue;
use tracing::debug;

use crate::cmd::GetArgs;
use crate::exit::{side_channel_error, CliResult, SUCCESS};
use crate::output::{print_values, OutputFormat};

pub fn run(args: GetArgs, format: OutputFormat) -> CliResult<i32> {
    let mut side = args.channel.open()?;

    // Room for the value plus its terminator.
    let mut dest = vec![0u8; args.max_size.saturating_add(1)];
    let len = side
        .snmp_get_into(&args.oid, &mut dest)
        .map_err(|err| side_channel_error("get failed", err))?;
    debug!(oid = %args.oid, len, "value received");

    dest.truncate(len);
    let value = SnmpValue {
        oid: args.oid,
        value: dest.into(),
    };
    print_values(std::slice::from_ref(&value), format);
    Ok(SUCCESS)
}
