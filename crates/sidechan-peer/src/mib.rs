//! In-memory SNMP table for backend emulation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use serde::Deserialize;
use sidechan_frame::Status;
use tracing::debug;

use crate::error::MibError;
use crate::responder::Reply;

/// A numeric object identifier.
///
/// Ordering is segment-wise, so `1.3.6.1.2` sorts before `1.3.6.1.10`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(Vec<u32>);

impl Oid {
    /// The numeric segments.
    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    /// Whether `self` lies strictly below `scope`.
    pub fn is_under(&self, scope: &Oid) -> bool {
        self.0.len() > scope.0.len() && self.0.starts_with(&scope.0)
    }
}

impl FromStr for Oid {
    type Err = MibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Err(MibError::InvalidOid(s.to_string()));
        }
        trimmed
            .split('.')
            .map(|segment| segment.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map(Oid)
            .map_err(|_| MibError::InvalidOid(s.to_string()))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

/// A value as it appears in a JSON MIB file. Numbers are stored in their
/// textual form, the way a backend renders SNMP integers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MibValue {
    Text(String),
    Number(serde_json::Number),
}

impl From<MibValue> for String {
    fn from(value: MibValue) -> Self {
        match value {
            MibValue::Text(text) => text,
            MibValue::Number(number) => number.to_string(),
        }
    }
}

/// Ordered OID to value table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MibTable {
    entries: BTreeMap<Oid, String>,
}

impl MibTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object mapping OID strings to values.
    pub fn from_json(json: &str) -> Result<Self, MibError> {
        let raw: BTreeMap<String, MibValue> = serde_json::from_str(json)?;
        Self::from_entries(raw)
    }

    /// Load a JSON MIB file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MibError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| MibError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub(crate) fn from_entries<K, V>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, MibError>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for (oid, value) in entries {
            table.insert(oid.as_ref().parse()?, value);
        }
        Ok(table)
    }

    pub fn insert(&mut self, oid: Oid, value: impl Into<String>) -> Option<String> {
        self.entries.insert(oid, value.into())
    }

    pub fn get(&self, oid: &Oid) -> Option<&str> {
        self.entries.get(oid).map(String::as_str)
    }

    /// The first entry strictly after `oid`.
    pub fn next_after(&self, oid: &Oid) -> Option<(&Oid, &str)> {
        use std::ops::Bound::{Excluded, Unbounded};
        self.entries
            .range((Excluded(oid), Unbounded))
            .next()
            .map(|(oid, value)| (oid, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &str)> {
        self.entries.iter().map(|(oid, value)| (oid, value.as_str()))
    }

    /// Answer an snmp-get payload (`oid\0`).
    ///
    /// The reply names the OID in the form it was requested, with or without
    /// a leading dot.
    pub fn reply_get(&self, payload: &[u8]) -> Reply {
        let Some((oid, dotted)) = requested_oid(payload) else {
            return Reply::status(Status::BadMessage);
        };
        match self.get(&oid) {
            Some(value) => Reply::ok(oid_value(&oid, dotted, value)),
            None => {
                debug!(%oid, "no such OID");
                Reply::status(Status::NoResponse)
            }
        }
    }

    /// Answer an snmp-get-next payload (`oid\0`).
    ///
    /// Past the end of the table the requested OID is echoed with an empty
    /// value, which a walker sees as a repeat or an out-of-scope key.
    pub fn reply_get_next(&self, payload: &[u8]) -> Reply {
        let Some((oid, dotted)) = requested_oid(payload) else {
            return Reply::status(Status::BadMessage);
        };
        match self.next_after(&oid) {
            Some((next, value)) => Reply::ok(oid_value(next, dotted, value)),
            None => {
                debug!(%oid, "end of table");
                Reply::ok(oid_value(&oid, dotted, ""))
            }
        }
    }
}

/// Parse a request payload, noting whether the OID had a leading dot.
fn requested_oid(payload: &[u8]) -> Option<(Oid, bool)> {
    let text = match payload.iter().position(|&b| b == 0) {
        Some(nul) => &payload[..nul],
        None => payload,
    };
    let text = std::str::from_utf8(text).ok()?;
    Some((text.parse().ok()?, text.starts_with('.')))
}

fn oid_value(oid: &Oid, dotted: bool, value: &str) -> Bytes {
    let oid = oid.to_string();
    let mut buf = BytesMut::with_capacity(oid.len() + 2 + value.len());
    if dotted {
        buf.put_u8(b'.');
    }
    buf.put_slice(oid.as_bytes());
    buf.put_u8(0);
    buf.put_slice(value.as_bytes());
    buf.freeze()
}
