use super::{DeviceHandle, PropertyMap};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_cr as serde;
use uuid::Uuid;

/// A summary of one `org.bluez.Device1` object, as found in a registry
/// snapshot.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_cr")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub handle: DeviceHandle,
    /// The device address exactly as BlueZ reports it.
    pub address: String,
    pub name: Option<String>,
    pub alias: Option<String>,
    pub paired: bool,
    pub connected: bool,
    pub trusted: bool,
    pub blocked: bool,
    /// Only present while the device is being seen by an active discovery.
    pub rssi: Option<i16>,
    pub services: Vec<Uuid>,
}

impl DeviceInfo {
    /// Build the summary from the `org.bluez.Device1` properties of `path`.
    ///
    /// Returns `None` when the object carries no `Address`.
    pub(crate) fn from_properties(path: &str, props: &PropertyMap) -> Option<Self> {
        let address = props.get("Address")?.as_str()?.to_owned();
        let string = |key: &str| props.get(key).and_then(|v| v.as_str()).map(str::to_owned);
        let flag = |key: &str| props.get(key).and_then(|v| v.as_bool()).unwrap_or(false);
        let services = props
            .get("UUIDs")
            .and_then(|v| v.as_array())
            .map(|uuids| {
                uuids
                    .iter()
                    .filter_map(|u| u.as_str())
                    .filter_map(|u| Uuid::parse_str(u).ok())
                    .collect()
            })
            .unwrap_or_default();
        Some(DeviceInfo {
            handle: DeviceHandle::new(path),
            address,
            name: string("Name"),
            alias: string("Alias"),
            paired: flag("Paired"),
            connected: flag("Connected"),
            trusted: flag("Trusted"),
            blocked: flag("Blocked"),
            rssi: props
                .get("RSSI")
                .and_then(|v| v.as_i64())
                .and_then(|rssi| i16::try_from(rssi).ok()),
            services,
        })
    }
}
