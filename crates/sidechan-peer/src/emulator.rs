//! A configurable backend that answers every side-channel command.

use std::collections::BTreeMap;
use std::path::Path;

use bytes::Bytes;
use serde::Deserialize;
use sidechan_frame::{Command, Status};
use tracing::debug;

use crate::device::{Bidi, DeviceState};
use crate::error::MibError;
use crate::mib::{MibTable, MibValue};
use crate::responder::{Reply, Request, RequestHandler};

/// JSON description of an emulated device.
///
/// ```json
/// {
///   "device_id": "MFG:ACME;MDL:LaserWriter;CMD:PJL,PS;",
///   "state": 0,
///   "bidi": true,
///   "connected": true,
///   "oids": { "1.3.6.1.2.1.1.5.0": "printer-7" }
/// }
/// ```
///
/// Every field is optional. Commands whose data is missing are answered
/// with not-implemented.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmulatorConfig {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub state: Option<u8>,
    #[serde(default)]
    pub bidi: Option<bool>,
    #[serde(default)]
    pub connected: Option<bool>,
    #[serde(default)]
    pub oids: BTreeMap<String, MibValue>,
}

impl EmulatorConfig {
    pub fn from_json(json: &str) -> Result<Self, MibError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MibError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| MibError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Backend emulator. Pass it to [`SideChannel::serve`](crate::SideChannel::serve).
#[derive(Debug, Clone, Default)]
pub struct Emulator {
    device_id: Option<String>,
    state: Option<DeviceState>,
    bidi: Option<Bidi>,
    connected: Option<bool>,
    mib: MibTable,
}

impl Emulator {
    pub fn new(config: EmulatorConfig) -> Result<Self, MibError> {
        Ok(Self {
            device_id: config.device_id,
            state: config.state.map(DeviceState::from_bits_retain),
            bidi: config.bidi.map(|supported| {
                if supported {
                    Bidi::Supported
                } else {
                    Bidi::NotSupported
                }
            }),
            connected: config.connected,
            mib: MibTable::from_entries(config.oids)?,
        })
    }

    /// An emulator that only answers SNMP requests from `mib`.
    pub fn from_mib(mib: MibTable) -> Self {
        Self {
            mib,
            ..Self::default()
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MibError> {
        Self::new(EmulatorConfig::from_path(path)?)
    }

    pub fn mib(&self) -> &MibTable {
        &self.mib
    }

}

fn byte_reply(value: Option<u8>) -> Reply {
    match value {
        Some(byte) => Reply::ok(Bytes::copy_from_slice(&[byte])),
        None => Reply::status(Status::NotImplemented),
    }
}

impl RequestHandler for Emulator {
    fn handle(&mut self, request: &Request) -> Reply {
        debug!(command = %request.command, len = request.payload.len(), "emulating");
        match request.command {
            Command::SoftReset | Command::DrainOutput => Reply::status(Status::Ok),
            Command::GetBidi => byte_reply(self.bidi.map(|bidi| bidi as u8)),
            Command::GetDeviceId => match &self.device_id {
                Some(id) => Reply::ok(Bytes::copy_from_slice(id.as_bytes())),
                None => Reply::status(Status::NotImplemented),
            },
            Command::GetState => byte_reply(self.state.map(|state| state.bits())),
            Command::GetConnected => byte_reply(self.connected.map(u8::from)),
            Command::SnmpGet => self.mib.reply_get(&request.payload),
            Command::SnmpGetNext => self.mib.reply_get_next(&request.payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixStream;
    use std::thread;

    use super::*;
    use crate::side_channel::SideChannel;

    const DEVICE: &str = r#"{
        "device_id": "MFG:ACME;MDL:LaserWriter 9000;",
        "state": 48,
        "bidi": true,
        "connected": true,
        "oids": {
            "1.3.6.1.2.1.1.1.0": "ACME LaserWriter",
            "1.3.6.1.2.1.1.5.0": "printer-7",
            "1.3.6.1.2.1.43.5.1.1.17.1": "SN-0042",
            "1.3.6.1.2.1.43.10.2.1.4.1.1": 123456
        }
    }"#;

    fn spawn_emulator(emulator: Emulator) -> (SideChannel<UnixStream>, thread::JoinHandle<usize>) {
        let (client, backend) = UnixStream::pair().unwrap();
        let handle = thread::spawn(move || {
            let mut emulator = emulator;
            SideChannel::new(backend).serve(&mut emulator).unwrap()
        });
        (SideChannel::new(client), handle)
    }

    #[test]
    fn config_rejects_unknown_fields() {
        assert!(EmulatorConfig::from_json(r#"{"colour": true}"#).is_err());
        let config = EmulatorConfig::from_json("{}").unwrap();
        assert!(config.oids.is_empty());
    }

    #[test]
    fn typed_requests_against_emulator() {
        let emulator = Emulator::new(EmulatorConfig::from_json(DEVICE).unwrap()).unwrap();
        let (mut side, backend) = spawn_emulator(emulator);

        side.soft_reset().unwrap();
        side.drain_output().unwrap();
        assert_eq!(side.get_bidi().unwrap(), Bidi::Supported);
        assert_eq!(side.get_device_id().unwrap(), "MFG:ACME;MDL:LaserWriter 9000;");
        assert_eq!(
            side.get_state().unwrap(),
            DeviceState::MARKER_LOW | DeviceState::MARKER_EMPTY
        );
        assert!(side.get_connected().unwrap());

        drop(side);
        assert_eq!(backend.join().unwrap(), 6);
    }

    #[test]
    fn unset_fields_are_not_implemented() {
        let (mut side, backend) = spawn_emulator(Emulator::default());
        let err = side.get_device_id().unwrap_err();
        assert_eq!(err.status(), Status::NotImplemented);
        let err = side.get_state().unwrap_err();
        assert_eq!(err.status(), Status::NotImplemented);
        drop(side);
        assert_eq!(backend.join().unwrap(), 2);
    }

    #[test]
    fn walk_through_emulator() {
        let emulator = Emulator::new(EmulatorConfig::from_json(DEVICE).unwrap()).unwrap();
        let (mut side, backend) = spawn_emulator(emulator);

        let mut seen = Vec::new();
        let count = side
            .snmp_walk_with("1.3.6.1.2.1.1", |oid, value| {
                seen.push(format!("{oid}={}", String::from_utf8_lossy(value)));
            })
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            seen,
            vec![
                "1.3.6.1.2.1.1.1.0=ACME LaserWriter",
                "1.3.6.1.2.1.1.5.0=printer-7"
            ]
        );

        let mut dest = [0u8; 16];
        let len = side
            .snmp_get_into("1.3.6.1.2.1.43.10.2.1.4.1.1", &mut dest)
            .unwrap();
        assert_eq!(&dest[..=len], b"123456\0");

        drop(side);
        // Three get-next rounds for the walk, one get.
        assert_eq!(backend.join().unwrap(), 4);
    }

    #[test]
    fn walk_with_leading_dot_scope() {
        let emulator = Emulator::new(EmulatorConfig::from_json(DEVICE).unwrap()).unwrap();
        let (mut side, backend) = spawn_emulator(emulator);

        assert_eq!(
            side.snmp_get(".1.3.6.1.2.1.1.5.0").unwrap().oid,
            ".1.3.6.1.2.1.1.5.0"
        );

        let mut seen = Vec::new();
        let count = side
            .snmp_walk_with(".1.3.6.1.2.1.1", |oid, _| seen.push(oid.to_string()))
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(seen, vec![".1.3.6.1.2.1.1.1.0", ".1.3.6.1.2.1.1.5.0"]);

        drop(side);
        backend.join().unwrap();
    }

    #[test]
    fn walk_to_end_of_table_finishes_cleanly() {
        let mut mib = MibTable::new();
        mib.insert("1.3.6.1.4.1.1".parse().unwrap(), "only");
        let (mut side, backend) = spawn_emulator(Emulator::from_mib(mib));

        let values: Vec<_> = side
            .snmp_walk("1.3.6.1.4")
            .collect::<crate::Result<_>>()
            .unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value_str(), "only");

        drop(side);
        backend.join().unwrap();
    }
}
