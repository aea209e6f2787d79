// bluez-locate Source Code File
//
// Copyright 2020 Nonpolynomial Labs LLC. All rights reserved.
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! The `api` module contains the traits and types which make up bluez-locate's
//! view of the BlueZ object registry.
//!
//! A [`Transport`] delivers snapshots of the registry ([`ManagedObjects`]) and
//! forwards method calls. Resolution produces [`AdapterHandle`]s and
//! [`DeviceHandle`]s, and the [`RemoteObject`] trait turns a handle plus a
//! transport back into property reads and method calls.

mod device;
mod handle;
mod registry;
mod value;

pub use device::DeviceInfo;
pub use handle::{AdapterHandle, DeviceHandle};
pub use registry::{InterfaceMap, ManagedObjects, PropertyMap};
pub use value::PropertyValue;

use crate::{Error, Result, PROPERTIES_INTERFACE};
use async_trait::async_trait;
use log::trace;

/// A transport-level failure, as reported by the message bus or the remote
/// service.
///
/// `name` is the D-Bus error name (e.g.
/// `org.freedesktop.DBus.Error.ServiceUnknown`). Converting a `Fault` into an
/// [`Error`] picks the matching error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    pub name: String,
    pub message: Option<String>,
}

impl Fault {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Fault {
            name: name.into(),
            message: Some(message.into()),
        }
    }
}

/// Access to the remote object registry and to methods on its objects.
///
/// Implementations own their connection; every call to
/// [`Transport::managed_objects`] must return a fresh snapshot.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch every managed object with its interfaces and properties.
    async fn managed_objects(&self) -> Result<ManagedObjects>;

    /// Call `method` of `interface` on the object at `path`.
    async fn invoke(
        &self,
        path: &str,
        interface: &str,
        method: &str,
        args: Vec<PropertyValue>,
    ) -> Result<Vec<PropertyValue>>;
}

/// An object in the registry that further calls can be addressed to.
#[async_trait]
pub trait RemoteObject: Send + Sync {
    /// The object path this handle is bound to.
    fn path(&self) -> &str;

    /// The interface calls through this handle are addressed to.
    fn interface(&self) -> &str;

    /// Call a method of this object's interface.
    async fn call<T>(
        &self,
        transport: &T,
        method: &str,
        args: Vec<PropertyValue>,
    ) -> Result<Vec<PropertyValue>>
    where
        T: Transport + ?Sized,
    {
        trace!("{}.{} on {}", self.interface(), method, self.path());
        transport
            .invoke(self.path(), self.interface(), method, args)
            .await
    }

    /// Read a single property of this object's interface.
    async fn property<T>(&self, transport: &T, name: &str) -> Result<PropertyValue>
    where
        T: Transport + ?Sized,
    {
        let reply = transport
            .invoke(
                self.path(),
                PROPERTIES_INTERFACE,
                "Get",
                vec![self.interface().into(), name.into()],
            )
            .await?;
        reply
            .into_iter()
            .next()
            .map(|value| value.flatten().clone())
            .ok_or_else(|| {
                Error::UnexpectedReply(format!("empty reply reading {} of {}", name, self.path()))
            })
    }

    /// Read every property of this object's interface.
    async fn properties<T>(&self, transport: &T) -> Result<PropertyMap>
    where
        T: Transport + ?Sized,
    {
        let reply = transport
            .invoke(
                self.path(),
                PROPERTIES_INTERFACE,
                "GetAll",
                vec![self.interface().into()],
            )
            .await?;
        match reply.into_iter().next().as_ref().map(PropertyValue::flatten) {
            Some(PropertyValue::Dict(entries)) => Ok(entries
                .iter()
                .map(|(k, v)| (k.clone(), v.flatten().clone()))
                .collect()),
            other => Err(Error::UnexpectedReply(format!(
                "expected a property dictionary from {}, got {:?}",
                self.path(),
                other
            ))),
        }
    }

    /// Write a single property of this object's interface.
    async fn set_property<T>(&self, transport: &T, name: &str, value: PropertyValue) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        transport
            .invoke(
                self.path(),
                PROPERTIES_INTERFACE,
                "Set",
                vec![
                    self.interface().into(),
                    name.into(),
                    PropertyValue::variant(value),
                ],
            )
            .await?;
        Ok(())
    }
}
