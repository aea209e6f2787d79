// bluez-locate Source Code File
//
// Copyright 2020 Nonpolynomial Labs LLC. All rights reserved.
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! [`Transport`] over the D-Bus system bus.

mod util;

use crate::api::{ManagedObjects, PropertyValue, Transport};
use crate::{Error, Result, BLUEZ_SERVICE};
use async_trait::async_trait;
use dbus::blocking::stdintf::org_freedesktop_dbus::ObjectManager;
use dbus::blocking::{BlockingSender, SyncConnection};
use dbus::strings::{BusName, Interface, Member, Path};
use dbus::Message;
use log::{debug, trace};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_cr as serde;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`DbusTransport`].
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_cr", default)
)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransportConfig {
    /// Bus name of the service owning the object manager.
    pub service: String,
    /// Method call timeout.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            service: BLUEZ_SERVICE.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A [`Transport`] talking to BlueZ over a system bus connection.
///
/// The connection is opened once and shared by clones; it lives as long as the
/// last clone. Calls are blocking D-Bus round trips run on tokio's blocking
/// pool, so a tokio runtime must be running.
#[derive(Clone)]
pub struct DbusTransport {
    connection: Arc<SyncConnection>,
    config: TransportConfig,
}

impl DbusTransport {
    /// Connect to the system bus.
    pub fn system(config: TransportConfig) -> Result<Self> {
        let connection = SyncConnection::new_system()?;
        debug!("Connected to the system bus for {}", config.service);
        Ok(Self::with_connection(Arc::new(connection), config))
    }

    /// Use an existing connection, e.g. a session bus for testing.
    pub fn with_connection(connection: Arc<SyncConnection>, config: TransportConfig) -> Self {
        DbusTransport { connection, config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn blocking<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&SyncConnection, &TransportConfig) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let connection = self.connection.clone();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || f(&connection, &config))
            .await
            .map_err(|e| Error::Other(Box::new(e)))?
    }
}

impl Debug for DbusTransport {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("DbusTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn invalid_name(e: String) -> Error {
    Error::Transport(format!("invalid D-Bus name: {}", e))
}

#[async_trait]
impl Transport for DbusTransport {
    async fn managed_objects(&self) -> Result<ManagedObjects> {
        self.blocking(|connection, config| {
            let service = BusName::new(config.service.as_str()).map_err(invalid_name)?;
            let proxy = connection.with_proxy(service, "/", config.timeout);
            let objects = proxy.get_managed_objects()?;
            let mut entries: Vec<_> = objects
                .into_iter()
                .map(|(path, interfaces)| ((*path).to_owned(), util::interfaces(interfaces)))
                .collect();
            // The reply is a dictionary; fix an order so lookups are repeatable.
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            trace!("Fetched {} managed objects", entries.len());
            Ok(entries.into_iter().collect())
        })
        .await
    }

    async fn invoke(
        &self,
        path: &str,
        interface: &str,
        method: &str,
        args: Vec<PropertyValue>,
    ) -> Result<Vec<PropertyValue>> {
        let path = Path::new(path).map_err(invalid_name)?;
        let interface = Interface::new(interface).map_err(invalid_name)?;
        let method = Member::new(method).map_err(invalid_name)?;
        self.blocking(move |connection, config| {
            let service = BusName::new(config.service.as_str()).map_err(invalid_name)?;
            trace!("Calling {}.{} on {}", interface, method, path);
            let args = args
                .iter()
                .map(util::to_refarg)
                .collect::<Result<Vec<_>>>()?;
            let message = Message::new_method_call(service, path, interface, method)
                .map_err(invalid_name)?
                .append_ref(&args);
            let reply = connection.send_with_reply_and_block(message, config.timeout)?;

            let mut values = Vec::new();
            let mut iter = reply.iter_init();
            while let Some(arg) = iter.get_refarg() {
                values.push(util::from_refarg(&*arg));
                iter.next();
            }
            Ok(values)
        })
        .await
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_missing_fields() {
        let config: TransportConfig = toml::from_str(r#"service = "org.bluez.test""#).unwrap();
        assert_eq!(config.service, "org.bluez.test");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }
}
