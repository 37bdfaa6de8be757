//! Defines types and interfaces that drivers use to interact with
//! the mapper host.

use crate::types::{device, Error, Fragment};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::Result;

/// The working identity of the device a request addresses, resolved
/// from the configuration fragments. The mapper doesn't hold a
/// session per device; instead every request carries the fragments
/// and the driver re-resolves the identity before touching its
/// registry.

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Identity {
    /// Identifies the protocol group the device belongs to.
    pub protocol_id: i32,

    /// Address of the device within the driver's registry.
    pub device_id: i32,

    /// The data shape a read is expected to produce.
    pub data_type: String,
}

/// Decodes one configuration fragment into a driver's parameter
/// type. Since each driver can have vastly different requirements,
/// the host hands fragments over as opaque JSON payloads and the
/// driver picks the shape to decode into. Decoding is
/// forwards-compatible: unknown fields are ignored so a newer host
/// can keep talking to an older driver.

pub fn decode_fragment<T>(which: Fragment, raw: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(raw)
        .map_err(|e| Error::ConfigDecode(which, e.to_string()))
}

/// All drivers implement the `driver::API` trait.
///
/// The `API` trait defines the methods the mapper host expects from
/// a driver instance. The host may call them concurrently from
/// several worker tasks, for the same or for different devices, so a
/// driver serializes access to its own state internally. Every
/// method resolves the supplied fragments first; an absent fragment
/// means "no update" to the previously resolved identity.

#[async_trait]
pub trait API: Send + Sync {
    /// Performs the one-time setup a driver needs before serving
    /// requests. `common` optionally carries the shared settings of
    /// the device group. A failure here is reported to the host but
    /// doesn't disable the instance; later calls resolve their own
    /// fragments and may succeed.
    async fn init_device(&self, common: Option<&[u8]>) -> Result<()>;

    /// Resolves the supplied fragments into a device identity and
    /// lazily registers the addressed device. This is the
    /// configuration step every data operation performs implicitly.
    async fn set_config(
        &self,
        common: Option<&[u8]>,
        visitor: Option<&[u8]>,
        protocol: Option<&[u8]>,
    ) -> Result<Identity>;

    /// Reads the current value of the addressed device, shaped
    /// according to the resolved `data_type`.
    async fn read_device_data(
        &self,
        common: Option<&[u8]>,
        visitor: Option<&[u8]>,
        protocol: Option<&[u8]>,
    ) -> Result<device::Value>;

    /// Writes a value to the addressed device. The value must be
    /// convertible to the device's storage type.
    async fn write_device_data(
        &self,
        value: device::Value,
        common: Option<&[u8]>,
        visitor: Option<&[u8]>,
        protocol: Option<&[u8]>,
    ) -> Result<()>;

    /// Reports whether the driver considers the device usable with
    /// the supplied configuration. This is a configuration sanity
    /// probe, not a hardware liveness check.
    async fn get_device_status(
        &self,
        common: Option<&[u8]>,
        visitor: Option<&[u8]>,
        protocol: Option<&[u8]>,
    ) -> bool;

    /// Called when the mapper stops serving. Drivers holding real
    /// connections disconnect here; purely simulated drivers simply
    /// acknowledge.
    async fn stop_device(&self) -> Result<()>;
}
