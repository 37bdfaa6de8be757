//! The in-memory registry of last-known device values, keyed by
//! device ID.

use edgemap_api::{Error, Result};
use std::collections::HashMap;

/// Maps a device ID to the last value written to it. An entry holding
/// `None` marks a device that has been registered but never written,
/// which keeps a legitimately written zero distinct from "no value
/// yet". Entries are never removed; the registry lives exactly as
/// long as the driver instance owning it.

#[derive(Debug, Default)]
pub struct Registry(HashMap<i32, Option<i64>>);

impl Registry {
    pub fn new() -> Registry {
        Registry(HashMap::new())
    }

    /// Lazily registers a device. Registering an existing device,
    /// written or not, leaves its entry untouched.

    pub fn register(&mut self, id: i32) {
        self.0.entry(id).or_insert(None);
    }

    /// Returns the last value written to the device.

    pub fn read(&self, id: i32) -> Result<i64> {
        match self.0.get(&id) {
            Some(Some(v)) => Ok(*v),
            Some(None) => Err(Error::DeviceNotReady(id)),
            None => Err(Error::NotFound),
        }
    }

    /// Stores a new value for the device, registering it first if
    /// needed. Any 64-bit value is accepted; the simulated hardware
    /// imposes no range.

    pub fn write(&mut self, id: i32, value: i64) {
        let _ = self.0.insert(id, Some(value));
    }
}
