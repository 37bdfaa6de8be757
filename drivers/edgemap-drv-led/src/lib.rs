use async_trait::async_trait;
use edgemap_api::{
    device,
    driver::{self, Identity},
    Error, Result,
};
use tokio::sync::Mutex;
use tracing::{error, info};

mod config;
mod registry;

use registry::Registry;

// The discrete state a read projects. The simulated controller only
// models whether a device has been set at all, so every initialized
// device reports the same state.

const STATE_OFF: &str = "OFF";

// Where the instance is in the host's lifecycle contract. The host
// owns the calling discipline, so the data path never gates on this;
// it exists for diagnostics.

#[derive(Debug, PartialEq)]
enum Lifecycle {
    Uninitialized,
    Ready,
    Stopped,
}

// Everything a public operation touches lives behind one lock so
// that resolving an identity and updating the registry are atomic
// together. A concurrent reader can never observe a freshly resolved
// device ID before it has been registered.

struct State {
    lifecycle: Lifecycle,
    identity: Identity,
    registry: Registry,
}

pub struct Instance {
    state: Mutex<State>,
}

impl Instance {
    pub const NAME: &'static str = "led-controller";

    pub const SUMMARY: &'static str = "simulates a bank of LED controllers";

    pub const DESCRIPTION: &'static str = include_str!("../README.md");

    /// Creates a new `Instance` with an empty registry. Devices
    /// appear in the registry on first use and stay until the
    /// instance is dropped.

    pub fn new() -> Instance {
        Instance {
            state: Mutex::new(State {
                lifecycle: Lifecycle::Uninitialized,
                identity: Identity::default(),
                registry: Registry::new(),
            }),
        }
    }

    // Folds the present fragments into the working identity, in the
    // fixed order common, visitor, protocol. The merge is
    // best-effort sequential: a fragment that fails to decode
    // applies nothing, but updates from fragments decoded earlier in
    // the same call remain. On success the resolved device is
    // registered and the instance counts as ready.

    fn resolve(
        state: &mut State,
        common: Option<&[u8]>,
        visitor: Option<&[u8]>,
        protocol: Option<&[u8]>,
    ) -> Result<Identity> {
        if let Some(raw) = common {
            config::parse_common(raw)
                .map_err(|e| {
                    error!("{}", &e);
                    e
                })?
                .apply(&mut state.identity);
        }

        if let Some(raw) = visitor {
            config::parse_visitor(raw)
                .map_err(|e| {
                    error!("{}", &e);
                    e
                })?
                .apply(&mut state.identity);
        }

        if let Some(raw) = protocol {
            config::parse_protocol(raw)
                .map_err(|e| {
                    error!("{}", &e);
                    e
                })?
                .apply(&mut state.identity);
        }

        state.registry.register(state.identity.device_id);

        if state.lifecycle == Lifecycle::Uninitialized {
            state.lifecycle = Lifecycle::Ready;
        }

        Ok(state.identity.clone())
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl driver::API for Instance {
    async fn init_device(&self, common: Option<&[u8]>) -> Result<()> {
        let mut state = self.state.lock().await;

        if let Some(raw) = common {
            config::parse_common(raw)
                .map_err(|e| {
                    error!("{}", &e);
                    e
                })?
                .apply(&mut state.identity);
        }

        state.lifecycle = Lifecycle::Ready;
        info!("initialized device group {}", state.identity.protocol_id);
        Ok(())
    }

    async fn set_config(
        &self,
        common: Option<&[u8]>,
        visitor: Option<&[u8]>,
        protocol: Option<&[u8]>,
    ) -> Result<Identity> {
        let mut state = self.state.lock().await;

        Instance::resolve(&mut state, common, visitor, protocol)
    }

    async fn read_device_data(
        &self,
        common: Option<&[u8]>,
        visitor: Option<&[u8]>,
        protocol: Option<&[u8]>,
    ) -> Result<device::Value> {
        let mut state = self.state.lock().await;
        let id = Instance::resolve(&mut state, common, visitor, protocol)?;

        if id.data_type != "string" {
            return Err(Error::UnsupportedDataType(id.data_type));
        }

        // The stored value only marks the device as initialized; the
        // reading itself is the controller's discrete state.

        let _ = state.registry.read(id.device_id)?;

        Ok(device::Value::Str(STATE_OFF.into()))
    }

    async fn write_device_data(
        &self,
        value: device::Value,
        common: Option<&[u8]>,
        visitor: Option<&[u8]>,
        protocol: Option<&[u8]>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let id = Instance::resolve(&mut state, common, visitor, protocol)?;

        // The registry stores 64-bit integers; anything else is
        // rejected before the entry is touched.

        let value = i64::try_from(value)?;

        state.registry.write(id.device_id, value);
        Ok(())
    }

    async fn get_device_status(
        &self,
        common: Option<&[u8]>,
        visitor: Option<&[u8]>,
        protocol: Option<&[u8]>,
    ) -> bool {
        let mut state = self.state.lock().await;

        Instance::resolve(&mut state, common, visitor, protocol).is_ok()
    }

    async fn stop_device(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        // The registry is pure memory; there is no connection to
        // tear down.

        state.lifecycle = Lifecycle::Stopped;
        info!("LED controller stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgemap_api::{driver::API, Fragment};
    use std::sync::Arc;
    use tokio::sync::Barrier;

    const COMMON: &[u8] = br#"{"customizedValues": {"protocolID": 1}}"#;
    const VISITOR: &[u8] =
        br#"{"protocolName": "ledController", "dataType": "string"}"#;
    const PROTOCOL: &[u8] =
        br#"{"protocolName": "ledController", "deviceID": 42}"#;

    #[tokio::test]
    async fn test_set_config() {
        let drv = Instance::new();

        let id = drv
            .set_config(Some(COMMON), Some(VISITOR), Some(PROTOCOL))
            .await
            .unwrap();

        assert_eq!(
            id,
            Identity {
                protocol_id: 1,
                device_id: 42,
                data_type: String::from("string")
            }
        );

        // Absent fragments leave the previous resolution in place.

        let id = drv.set_config(None, None, None).await.unwrap();

        assert_eq!(id.device_id, 42);
        assert_eq!(id.data_type, "string");
    }

    #[tokio::test]
    async fn test_set_config_bad_fragment() {
        let drv = Instance::new();

        match drv
            .set_config(Some(COMMON), Some(VISITOR), Some(b"not json"))
            .await
        {
            Err(Error::ConfigDecode(Fragment::Protocol, _)) => (),
            v => panic!("unexpected result: {:?}", v),
        }

        // The merge is best-effort: fragments decoded before the
        // failure stay applied, the failing one applies nothing.

        let id = drv.set_config(None, None, None).await.unwrap();

        assert_eq!(id.protocol_id, 1);
        assert_eq!(id.data_type, "string");
        assert_eq!(id.device_id, 0);
    }

    #[tokio::test]
    async fn test_read_before_write() {
        let drv = Instance::new();

        match drv
            .read_device_data(Some(COMMON), Some(VISITOR), Some(PROTOCOL))
            .await
        {
            Err(Error::DeviceNotReady(42)) => (),
            v => panic!("unexpected result: {:?}", v),
        }
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let drv = Instance::new();

        drv.write_device_data(
            device::Value::Int(1),
            Some(COMMON),
            Some(VISITOR),
            Some(PROTOCOL),
        )
        .await
        .unwrap();

        let v = drv
            .read_device_data(Some(COMMON), Some(VISITOR), Some(PROTOCOL))
            .await
            .unwrap();

        assert_eq!(v, device::Value::Str(String::from("OFF")));
    }

    #[tokio::test]
    async fn test_written_zero_is_initialized() {
        let drv = Instance::new();

        // Zero is a legitimate setting, not the never-written state.

        drv.write_device_data(
            device::Value::Int(0),
            Some(COMMON),
            Some(VISITOR),
            Some(PROTOCOL),
        )
        .await
        .unwrap();

        let v = drv
            .read_device_data(Some(COMMON), Some(VISITOR), Some(PROTOCOL))
            .await
            .unwrap();

        assert_eq!(v, device::Value::Str(String::from("OFF")));
    }

    #[tokio::test]
    async fn test_unsupported_data_type() {
        let drv = Instance::new();
        let visitor: &[u8] =
            br#"{"protocolName": "ledController", "dataType": "int"}"#;

        match drv
            .read_device_data(Some(COMMON), Some(visitor), Some(PROTOCOL))
            .await
        {
            Err(Error::UnsupportedDataType(v)) => assert_eq!(v, "int"),
            v => panic!("unexpected result: {:?}", v),
        }

        // The shape check fails regardless of registry state.

        drv.write_device_data(
            device::Value::Int(1),
            Some(COMMON),
            Some(visitor),
            Some(PROTOCOL),
        )
        .await
        .unwrap();

        match drv
            .read_device_data(Some(COMMON), Some(visitor), Some(PROTOCOL))
            .await
        {
            Err(Error::UnsupportedDataType(_)) => (),
            v => panic!("unexpected result: {:?}", v),
        }
    }

    #[tokio::test]
    async fn test_write_type_mismatch() {
        let drv = Instance::new();

        match drv
            .write_device_data(
                device::Value::Str(String::from("ON")),
                Some(COMMON),
                Some(VISITOR),
                Some(PROTOCOL),
            )
            .await
        {
            Err(Error::TypeError) => (),
            v => panic!("unexpected result: {:?}", v),
        }

        // The rejected write must not have initialized the device.

        match drv
            .read_device_data(Some(COMMON), Some(VISITOR), Some(PROTOCOL))
            .await
        {
            Err(Error::DeviceNotReady(_)) => (),
            v => panic!("unexpected result: {:?}", v),
        }
    }

    #[tokio::test]
    async fn test_status() {
        let drv = Instance::new();

        // No fragments at all is a valid, empty resolution.

        assert!(drv.get_device_status(None, None, None).await);
        assert!(
            drv.get_device_status(Some(COMMON), Some(VISITOR), Some(PROTOCOL))
                .await
        );
        assert!(
            !drv.get_device_status(Some(b"{"), Some(VISITOR), Some(PROTOCOL))
                .await
        );

        // An unsupported data type is still a healthy configuration;
        // only a read cares about the shape.

        let visitor: &[u8] = br#"{"dataType": "int"}"#;

        assert!(drv.get_device_status(None, Some(visitor), None).await);
    }

    #[tokio::test]
    async fn test_init_failure_is_retryable() {
        let drv = Instance::new();

        assert!(drv.init_device(Some(b"not json")).await.is_err());
        assert_eq!(
            drv.state.lock().await.lifecycle,
            Lifecycle::Uninitialized
        );

        // A failed init must not poison later resolutions.

        let id = drv
            .set_config(Some(COMMON), Some(VISITOR), Some(PROTOCOL))
            .await
            .unwrap();

        assert_eq!(id.device_id, 42);
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let drv = Instance::new();

        assert_eq!(
            drv.state.lock().await.lifecycle,
            Lifecycle::Uninitialized
        );

        // Init without a common fragment counts as a skipped init.

        drv.init_device(None).await.unwrap();
        assert_eq!(drv.state.lock().await.lifecycle, Lifecycle::Ready);

        drv.stop_device().await.unwrap();
        assert_eq!(drv.state.lock().await.lifecycle, Lifecycle::Stopped);

        // Stopping never fails.

        assert!(drv.stop_device().await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_writes() {
        let drv = Arc::new(Instance::new());
        let barrier = Arc::new(Barrier::new(2));
        let mut tasks = Vec::new();

        for v in [5i64, 7i64] {
            let drv = drv.clone();
            let barrier = barrier.clone();

            tasks.push(tokio::spawn(async move {
                barrier.wait().await;
                drv.write_device_data(
                    device::Value::Int(v),
                    Some(COMMON),
                    Some(VISITOR),
                    Some(PROTOCOL),
                )
                .await
            }));
        }

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // One of the writers must have won outright; a mixture would
        // mean the resolve-and-write section isn't atomic.

        let v = drv.state.lock().await.registry.read(42).unwrap();

        assert!(v == 5 || v == 7);
    }
}
