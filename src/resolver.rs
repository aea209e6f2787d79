// bluez-locate Source Code File
//
// Copyright 2020 Nonpolynomial Labs LLC. All rights reserved.
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! Adapter and device lookup against a registry snapshot.
//!
//! Two adapter lookup policies exist and they accept different selectors:
//!
//! * [`LookupPolicy::Pattern`] takes the first adapter whose `Address` equals
//!   the selector or whose object path ends with it.
//! * [`LookupPolicy::PathConstruction`] treats the selector as an adapter id,
//!   builds `/org/bluez/<id>` and requires that exact path to be an adapter.
//!
//! With `Pattern`, `"ci0"` finds `/org/bluez/hci0`; with `PathConstruction`
//! it does not, and an address never matches.

use crate::api::{AdapterHandle, DeviceHandle, DeviceInfo, ManagedObjects, Transport};
use crate::{Error, Result, ADAPTER_INTERFACE, BLUEZ_ROOT_PATH, DEVICE_INTERFACE};
use log::{debug, trace};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_cr as serde;

/// How an adapter selector is matched against the registry.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_cr", rename_all = "kebab-case")
)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum LookupPolicy {
    /// Match on the `Address` property or on an object path suffix.
    #[default]
    Pattern,
    /// Match `/org/bluez/<selector>` exactly.
    PathConstruction,
}

/// Resolver settings.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_cr", default)
)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResolverConfig {
    pub policy: LookupPolicy,
}

/// Resolves adapters and devices through a [`Transport`].
///
/// Each lookup fetches a fresh registry snapshot; nothing is cached between
/// calls.
#[derive(Clone, Debug)]
pub struct AdapterResolver<T> {
    transport: T,
    config: ResolverConfig,
}

impl<T: Transport> AdapterResolver<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ResolverConfig::default())
    }

    pub fn with_config(transport: T, config: ResolverConfig) -> Self {
        AdapterResolver { transport, config }
    }

    /// The transport lookups go through, for calls on resolved handles.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Find the adapter matching `selector` under the configured policy.
    ///
    /// `None` and `Some("")` both select the first adapter.
    pub async fn find_adapter(&self, selector: Option<&str>) -> Result<AdapterHandle> {
        let objects = self.transport.managed_objects().await?;
        let adapter = find_adapter_in_objects(&objects, selector, self.config.policy)?;
        debug!("Resolved adapter {:?} to {}", selector, adapter);
        Ok(adapter)
    }

    /// Object path of the adapter matching `selector`.
    pub async fn adapter_path(&self, selector: Option<&str>) -> Result<String> {
        self.find_adapter(selector)
            .await
            .map(|adapter| adapter.to_string())
    }

    /// Every adapter in the registry, in registry order.
    pub async fn adapters(&self) -> Result<Vec<AdapterHandle>> {
        let objects = self.transport.managed_objects().await?;
        Ok(objects
            .with_interface(ADAPTER_INTERFACE)
            .map(|(path, _)| AdapterHandle::new(path))
            .collect())
    }

    /// Find the device whose `Address` is exactly `address`.
    ///
    /// `adapter_selector` is accepted but does not narrow the search; a device
    /// on any adapter can match.
    pub async fn find_device(
        &self,
        address: &str,
        adapter_selector: Option<&str>,
    ) -> Result<DeviceHandle> {
        let objects = self.transport.managed_objects().await?;
        find_device_in_objects(&objects, address, adapter_selector)
    }

    /// Devices known below `adapter`, in registry order.
    pub async fn devices(&self, adapter: &AdapterHandle) -> Result<Vec<DeviceInfo>> {
        let objects = self.transport.managed_objects().await?;
        Ok(objects
            .with_interface(DEVICE_INTERFACE)
            .filter_map(|(path, props)| DeviceInfo::from_properties(path, props))
            .filter(|device| device.handle.is_under(adapter))
            .collect())
    }
}

fn non_empty(selector: Option<&str>) -> Option<&str> {
    selector.filter(|s| !s.is_empty())
}

/// Find an adapter in an already fetched snapshot.
pub fn find_adapter_in_objects(
    objects: &ManagedObjects,
    selector: Option<&str>,
    policy: LookupPolicy,
) -> Result<AdapterHandle> {
    let selector = non_empty(selector);
    match policy {
        LookupPolicy::Pattern => by_pattern(objects, selector),
        LookupPolicy::PathConstruction => by_constructed_path(objects, selector),
    }
}

fn by_pattern(objects: &ManagedObjects, selector: Option<&str>) -> Result<AdapterHandle> {
    for (path, props) in objects.with_interface(ADAPTER_INTERFACE) {
        let matched = match selector {
            None => true,
            Some(selector) => {
                props.get("Address").and_then(|a| a.as_str()) == Some(selector)
                    || path.ends_with(selector)
            }
        };
        if matched {
            return Ok(AdapterHandle::new(path));
        }
        trace!("Adapter {} does not match {:?}", path, selector);
    }
    Err(Error::AdapterNotFound(None))
}

fn by_constructed_path(objects: &ManagedObjects, selector: Option<&str>) -> Result<AdapterHandle> {
    let mut adapters = objects.with_interface(ADAPTER_INTERFACE).map(|(path, _)| path);
    match selector {
        Some(id) => {
            let wanted = format!("{}/{}", BLUEZ_ROOT_PATH, id);
            adapters
                .find(|path| *path == wanted)
                .map(AdapterHandle::new)
                .ok_or_else(|| Error::AdapterNotFound(Some(id.to_owned())))
        }
        None => adapters
            .next()
            .map(AdapterHandle::new)
            .ok_or(Error::NoAdaptersFound),
    }
}

/// Find a device in an already fetched snapshot. See
/// [`AdapterResolver::find_device`].
pub fn find_device_in_objects(
    objects: &ManagedObjects,
    address: &str,
    adapter_selector: Option<&str>,
) -> Result<DeviceHandle> {
    if let Some(adapter) = non_empty(adapter_selector) {
        debug!("Ignoring adapter selector {} while looking up {}", adapter, address);
    }
    objects
        .with_interface(DEVICE_INTERFACE)
        .find(|(_, props)| props.get("Address").and_then(|a| a.as_str()) == Some(address))
        .map(|(path, _)| DeviceHandle::new(path))
        .ok_or_else(|| Error::DeviceNotFound(address.to_owned()))
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn config_reads_from_toml() {
        let config: ResolverConfig = toml::from_str(r#"policy = "path-construction""#).unwrap();
        assert_eq!(config.policy, LookupPolicy::PathConstruction);
        let config: ResolverConfig = toml::from_str("").unwrap();
        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn policy_names_in_json() {
        assert_eq!(serde_json::to_string(&LookupPolicy::Pattern).unwrap(), r#""pattern""#);
        assert_eq!(
            serde_json::from_str::<LookupPolicy>(r#""path-construction""#).unwrap(),
            LookupPolicy::PathConstruction
        );
    }
}
