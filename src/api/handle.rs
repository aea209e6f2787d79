use super::{PropertyValue, RemoteObject, Transport};
use crate::{Error, Result, ADAPTER_INTERFACE, DEVICE_INTERFACE};
use async_trait::async_trait;
use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_cr as serde;
use std::fmt::{self, Display, Formatter};

/// A resolved `org.bluez.Adapter1` object.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_cr")
)]
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AdapterHandle {
    path: String,
}

/// A resolved `org.bluez.Device1` object.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_cr")
)]
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DeviceHandle {
    path: String,
}

impl AdapterHandle {
    pub(crate) fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The adapter's short name, e.g. `hci0` for `/org/bluez/hci0`.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Start device discovery.
    ///
    /// Returns `false` if BlueZ reports a discovery already in progress.
    pub async fn start_discovery<T: Transport + ?Sized>(&self, transport: &T) -> Result<bool> {
        self.discovery_call(transport, "StartDiscovery").await
    }

    /// Stop device discovery.
    ///
    /// Returns `false` if BlueZ reports another discovery operation in progress.
    pub async fn stop_discovery<T: Transport + ?Sized>(&self, transport: &T) -> Result<bool> {
        self.discovery_call(transport, "StopDiscovery").await
    }

    async fn discovery_call<T: Transport + ?Sized>(
        &self,
        transport: &T,
        method: &str,
    ) -> Result<bool> {
        match self.call(transport, method, Vec::new()).await {
            Ok(_) => {
                debug!("{} on {}", method, self.path);
                Ok(true)
            }
            Err(Error::InProgress(detail)) => {
                warn!(
                    "Operation already in progress: {} on {} ({})",
                    method, self.path, detail
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// The adapter's Bluetooth address, if BlueZ reports one.
    pub async fn address<T: Transport + ?Sized>(&self, transport: &T) -> Result<Option<String>> {
        self.text(transport, "Address").await
    }

    /// The adapter's system name (the `Name` property), not its path segment.
    pub async fn local_name<T: Transport + ?Sized>(
        &self,
        transport: &T,
    ) -> Result<Option<String>> {
        self.text(transport, "Name").await
    }

    pub async fn powered<T: Transport + ?Sized>(&self, transport: &T) -> Result<bool> {
        self.flag(transport, "Powered").await
    }

    pub async fn discoverable<T: Transport + ?Sized>(&self, transport: &T) -> Result<bool> {
        self.flag(transport, "Discoverable").await
    }

    pub async fn discovering<T: Transport + ?Sized>(&self, transport: &T) -> Result<bool> {
        self.flag(transport, "Discovering").await
    }

    // Absent or non-boolean properties read as false; transport faults still propagate.
    async fn flag<T: Transport + ?Sized>(&self, transport: &T, name: &str) -> Result<bool> {
        let properties = self.properties(transport).await?;
        Ok(properties
            .get(name)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false))
    }

    async fn text<T: Transport + ?Sized>(
        &self,
        transport: &T,
        name: &str,
    ) -> Result<Option<String>> {
        let properties = self.properties(transport).await?;
        Ok(properties
            .get(name)
            .and_then(PropertyValue::as_str)
            .map(str::to_owned))
    }

    pub async fn set_powered<T: Transport + ?Sized>(
        &self,
        transport: &T,
        powered: bool,
    ) -> Result<()> {
        self.set_property(transport, "Powered", powered.into()).await
    }

    pub async fn set_discoverable<T: Transport + ?Sized>(
        &self,
        transport: &T,
        discoverable: bool,
    ) -> Result<()> {
        self.set_property(transport, "Discoverable", discoverable.into())
            .await
    }

    /// Ask the adapter to forget `device`, including any pairing information.
    pub async fn remove_device<T: Transport + ?Sized>(
        &self,
        transport: &T,
        device: &DeviceHandle,
    ) -> Result<()> {
        self.call(
            transport,
            "RemoveDevice",
            vec![PropertyValue::ObjectPath(device.path.clone())],
        )
        .await?;
        debug!("Removed device {} from {}", device.path, self.path);
        Ok(())
    }
}

impl DeviceHandle {
    pub(crate) fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Whether this device belongs to `adapter`, judged by its object path.
    pub fn is_under(&self, adapter: &AdapterHandle) -> bool {
        self.path
            .strip_prefix(adapter.path.as_str())
            .map_or(false, |rest| rest.starts_with('/'))
    }
}

#[async_trait]
impl RemoteObject for AdapterHandle {
    fn path(&self) -> &str {
        &self.path
    }

    fn interface(&self) -> &str {
        ADAPTER_INTERFACE
    }
}

#[async_trait]
impl RemoteObject for DeviceHandle {
    fn path(&self) -> &str {
        &self.path
    }

    fn interface(&self) -> &str {
        DEVICE_INTERFACE
    }
}

impl Display for AdapterHandle {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.path.fmt(f)
    }
}

impl Display for DeviceHandle {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.path.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Fault, ManagedObjects, Transport};
    use crate::memory::{Call, MemoryTransport};
    use crate::{FAULT_IN_PROGRESS, FAULT_NOT_READY, PROPERTIES_INTERFACE};

    #[test]
    fn adapter_name_is_last_path_segment() {
        assert_eq!(AdapterHandle::new("/org/bluez/hci1").name(), "hci1");
    }

    #[test]
    fn device_membership_requires_a_path_boundary() {
        let hci1 = AdapterHandle::new("/org/bluez/hci1");
        assert!(DeviceHandle::new("/org/bluez/hci1/dev_11_22_33_44_55_66").is_under(&hci1));
        assert!(!DeviceHandle::new("/org/bluez/hci10/dev_11_22_33_44_55_66").is_under(&hci1));
        assert!(!DeviceHandle::new("/org/bluez/hci1").is_under(&hci1));
    }

    #[tokio::test]
    async fn start_discovery_calls_adapter_interface() {
        let transport = MemoryTransport::new(ManagedObjects::new());
        let adapter = AdapterHandle::new("/org/bluez/hci0");
        assert!(adapter.start_discovery(&transport).await.unwrap());
        assert_eq!(
            transport.calls(),
            vec![Call {
                path: "/org/bluez/hci0".into(),
                interface: ADAPTER_INTERFACE.into(),
                method: "StartDiscovery".into(),
                args: vec![],
            }]
        );
    }

    #[tokio::test]
    async fn discovery_in_progress_is_not_an_error() {
        let transport = MemoryTransport::new(ManagedObjects::new());
        transport.fail_method(
            "StopDiscovery",
            Fault::new(FAULT_IN_PROGRESS, "Operation already in progress"),
        );
        let adapter = AdapterHandle::new("/org/bluez/hci0");
        assert!(!adapter.stop_discovery(&transport).await.unwrap());
    }

    #[tokio::test]
    async fn discovery_not_ready_is_an_error() {
        let transport = MemoryTransport::new(ManagedObjects::new());
        transport.fail_method(
            "StartDiscovery",
            Fault::new(FAULT_NOT_READY, "Resource Not Ready"),
        );
        let adapter = AdapterHandle::new("/org/bluez/hci0");
        assert!(matches!(
            adapter.start_discovery(&transport).await,
            Err(Error::NotReady(_))
        ));
    }

    #[tokio::test]
    async fn set_powered_wraps_value_in_variant() {
        let objects = ManagedObjects::new().with_object(
            "/org/bluez/hci0",
            ADAPTER_INTERFACE,
            [("Powered", false)],
        );
        let transport = MemoryTransport::new(objects);
        let adapter = AdapterHandle::new("/org/bluez/hci0");
        adapter.set_powered(&transport, true).await.unwrap();
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].interface, PROPERTIES_INTERFACE);
        assert_eq!(calls[0].method, "Set");
        assert_eq!(
            calls[0].args,
            vec![
                PropertyValue::from(ADAPTER_INTERFACE),
                PropertyValue::from("Powered"),
                PropertyValue::variant(true),
            ]
        );
        let objects = transport.managed_objects().await.unwrap();
        assert_eq!(
            objects.get("/org/bluez/hci0").unwrap()[ADAPTER_INTERFACE].get("Powered"),
            Some(&PropertyValue::Bool(true))
        );
        assert!(adapter.powered(&transport).await.unwrap());
    }

    #[tokio::test]
    async fn remove_device_passes_object_path() {
        let transport = MemoryTransport::new(ManagedObjects::new());
        let adapter = AdapterHandle::new("/org/bluez/hci0");
        let device = DeviceHandle::new("/org/bluez/hci0/dev_11_22_33_44_55_66");
        adapter.remove_device(&transport, &device).await.unwrap();
        assert_eq!(
            transport.calls()[0].args,
            vec![PropertyValue::ObjectPath(
                "/org/bluez/hci0/dev_11_22_33_44_55_66".into()
            )]
        );
    }

    #[tokio::test]
    async fn property_reads_unwrap_variants() {
        let objects = ManagedObjects::new().with_object(
            "/org/bluez/hci0",
            ADAPTER_INTERFACE,
            [("Address", "AA:BB:CC:DD:EE:FF"), ("Name", "TestAdapter")],
        );
        let transport = MemoryTransport::new(objects);
        let adapter = AdapterHandle::new("/org/bluez/hci0");
        assert_eq!(
            adapter.property(&transport, "Name").await.unwrap(),
            PropertyValue::from("TestAdapter")
        );
        let all = adapter.properties(&transport).await.unwrap();
        assert_eq!(
            all.get("Address"),
            Some(&PropertyValue::from("AA:BB:CC:DD:EE:FF"))
        );
    }

    #[tokio::test]
    async fn typed_readers_default_missing_flags_to_false() {
        let objects = ManagedObjects::new().with_object(
            "/org/bluez/hci0",
            ADAPTER_INTERFACE,
            [
                ("Address", PropertyValue::from("AA:BB:CC:DD:EE:FF")),
                ("Name", PropertyValue::from("TestAdapter")),
                ("Discoverable", PropertyValue::from(true)),
            ],
        );
        let transport = MemoryTransport::new(objects);
        let adapter = AdapterHandle::new("/org/bluez/hci0");
        assert_eq!(
            adapter.address(&transport).await.unwrap().as_deref(),
            Some("AA:BB:CC:DD:EE:FF")
        );
        assert_eq!(
            adapter.local_name(&transport).await.unwrap().as_deref(),
            Some("TestAdapter")
        );
        assert!(adapter.discoverable(&transport).await.unwrap());
        assert!(!adapter.powered(&transport).await.unwrap());
        assert!(!adapter.discovering(&transport).await.unwrap());
    }

    #[tokio::test]
    async fn typed_readers_propagate_transport_faults() {
        let transport = MemoryTransport::new(ManagedObjects::new());
        let adapter = AdapterHandle::new("/org/bluez/hci0");
        assert!(matches!(
            adapter.powered(&transport).await,
            Err(Error::Transport(_))
        ));
    }
}
