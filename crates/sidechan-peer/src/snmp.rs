//! SNMP queries relayed through the backend.
//!
//! Requests carry a numeric OID (`"1.3.6.1.2.1.43"`) followed by a NUL.
//! Ok responses carry `<oid>\0<value>`, where the value is the backend's
//! string rendering of the variable. Symbolic MIB names are not supported.

use std::borrow::Cow;
use std::io::{Read, Write};
use std::os::fd::AsFd;

use bytes::Bytes;
use sidechan_frame::Command;
use tracing::debug;

use crate::error::{Result, SideChannelError};
use crate::side_channel::SideChannel;

/// One OID and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpValue {
    pub oid: String,
    pub value: Bytes,
}

impl SnmpValue {
    /// The value as text, replacing invalid UTF-8.
    pub fn value_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }
}

impl<T: AsFd + Read + Write> SideChannel<T> {
    /// Query one OID and copy its value into `dest`, followed by a NUL.
    ///
    /// Returns the value length without the terminator. `dest` must hold at
    /// least two bytes. A non-ok backend status is returned as
    /// [`SideChannelError::Status`] unchanged.
    pub fn snmp_get_into(&mut self, oid: &str, dest: &mut [u8]) -> Result<usize> {
        if dest.len() < 2 {
            return Err(SideChannelError::bad_message(
                "destination must hold at least two bytes",
            ));
        }
        dest[0] = 0;

        let found = self.snmp_query(Command::SnmpGet, oid)?;
        let len = found.value.len();
        if len + 1 > dest.len() {
            return Err(SideChannelError::TooBig {
                size: len + 1,
                max: dest.len(),
            });
        }

        dest[..len].copy_from_slice(&found.value);
        dest[len] = 0;
        Ok(len)
    }

    /// Query one OID.
    pub fn snmp_get(&mut self, oid: &str) -> Result<SnmpValue> {
        self.snmp_query(Command::SnmpGet, oid)
    }

    /// Query the OID that follows `oid`.
    pub fn snmp_get_next(&mut self, oid: &str) -> Result<SnmpValue> {
        self.snmp_query(Command::SnmpGetNext, oid)
    }

    /// Enumerate every OID under `scope`, one get-next round per item.
    ///
    /// The walk is lazy: nothing is sent until the first call to `next`.
    /// It ends cleanly when the backend returns an OID outside
    /// `scope + "."`, or the same OID twice in a row. The first failure is
    /// yielded as an error and ends the walk.
    pub fn snmp_walk<'a>(&'a mut self, scope: &str) -> SnmpWalk<'a, T> {
        SnmpWalk {
            side: self,
            prefix: format!("{scope}."),
            current: scope.to_string(),
            last: String::new(),
            done: false,
        }
    }

    /// Walk `scope`, calling `on_result` with each OID and value in order.
    ///
    /// Returns the number of values delivered. The callback runs inline, so
    /// the walk waits for it before sending the next request.
    pub fn snmp_walk_with<F>(&mut self, scope: &str, mut on_result: F) -> Result<usize>
    where
        F: FnMut(&str, &[u8]),
    {
        let mut delivered = 0usize;
        for item in self.snmp_walk(scope) {
            let item = item?;
            on_result(&item.oid, &item.value);
            delivered += 1;
        }
        Ok(delivered)
    }

    fn snmp_query(&mut self, command: Command, oid: &str) -> Result<SnmpValue> {
        let payload = oid_payload(oid)?;
        let response = self.do_request(command, &payload)?;
        if !response.status.is_ok() {
            return Err(SideChannelError::Status(response.status));
        }
        let (oid, value) = split_oid_value(&response.payload);
        Ok(SnmpValue {
            oid: String::from_utf8_lossy(&oid).into_owned(),
            value,
        })
    }
}

/// Lazy walk over an OID subtree. Created by [`SideChannel::snmp_walk`].
pub struct SnmpWalk<'a, T> {
    side: &'a mut SideChannel<T>,
    prefix: String,
    current: String,
    last: String,
    done: bool,
}

impl<T: AsFd + Read + Write> SnmpWalk<'_, T> {
    fn fail(&mut self, err: SideChannelError) -> Option<Result<SnmpValue>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<T: AsFd + Read + Write> Iterator for SnmpWalk<'_, T> {
    type Item = Result<SnmpValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let payload = match oid_payload(&self.current) {
            Ok(payload) => payload,
            Err(err) => return self.fail(err),
        };
        let response = match self.side.do_request(Command::SnmpGetNext, &payload) {
            Ok(response) => response,
            Err(err) => return self.fail(err),
        };
        if !response.status.is_ok() {
            if self.last.is_empty() {
                debug!(scope = %self.current, status = %response.status, "no data under scope");
            }
            return self.fail(SideChannelError::Status(response.status));
        }

        let (oid, value) = split_oid_value(&response.payload);
        if !oid.starts_with(self.prefix.as_bytes()) || oid == self.last.as_bytes() {
            debug!(prefix = %self.prefix, "walk complete");
            self.done = true;
            return None;
        }

        let oid = match String::from_utf8(oid.to_vec()) {
            Ok(oid) => oid,
            Err(_) => {
                return self.fail(SideChannelError::bad_message("returned OID is not UTF-8"))
            }
        };
        self.last.clone_from(&oid);
        self.current.clone_from(&oid);
        Some(Ok(SnmpValue { oid, value }))
    }
}

fn oid_payload(oid: &str) -> Result<Vec<u8>> {
    if oid.is_empty() {
        return Err(SideChannelError::bad_message("OID must not be empty"));
    }
    if oid.contains('\0') {
        return Err(SideChannelError::bad_message("OID must not contain NUL"));
    }
    let mut payload = Vec::with_capacity(oid.len() + 1);
    payload.extend_from_slice(oid.as_bytes());
    payload.push(0);
    Ok(payload)
}

/// Split `<oid>\0<value>`. Without a NUL the whole payload is the OID and
/// the value is empty.
fn split_oid_value(payload: &Bytes) -> (Bytes, Bytes) {
    match payload.iter().position(|&b| b == 0) {
        Some(nul) => (payload.slice(..nul), payload.slice(nul + 1..)),
        None => (payload.clone(), Bytes::new()),
    }
}
