// bluez-locate Source Code File
//
// Copyright 2020 Nonpolynomial Labs LLC. All rights reserved.
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! bluez-locate resolves BlueZ adapters and devices into handles.
//!
//! BlueZ publishes every adapter (`org.bluez.Adapter1`) and every known device
//! (`org.bluez.Device1`) through the D-Bus object manager. This crate fetches
//! that registry, picks the object a caller asked for, and hands back a small
//! handle (object path plus interface) that can be used for further calls.
//!
//! The registry is reached through the [`api::Transport`] trait, so the lookup
//! logic works the same against the system bus ([`bluez::DbusTransport`], Linux
//! only) and against the in-memory [`memory::MemoryTransport`].
//!
//! ```no_run
//! # #[cfg(target_os = "linux")]
//! # async fn run() -> bluez_locate::Result<()> {
//! use bluez_locate::bluez::DbusTransport;
//! use bluez_locate::resolver::AdapterResolver;
//!
//! let transport = DbusTransport::system(Default::default())?;
//! let resolver = AdapterResolver::new(transport);
//! let adapter = resolver.find_adapter(Some("hci0")).await?;
//! println!("using {}", adapter);
//! # Ok(())
//! # }
//! ```

pub mod api;
#[cfg(target_os = "linux")]
pub mod bluez;
mod constants;
pub mod memory;
pub mod platform;
pub mod resolver;

pub use constants::*;

use api::Fault;

/// The main error type returned by most methods in bluez-locate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Bluetooth service unavailable: {}", _0)]
    ServiceUnavailable(String),

    #[error("D-Bus transport error: {}", _0)]
    Transport(String),

    #[error("{}", adapter_not_found(.0.as_deref()))]
    AdapterNotFound(Option<String>),

    #[error("No Bluetooth adapters found")]
    NoAdaptersFound,

    #[error("Bluetooth device {} not found", _0)]
    DeviceNotFound(String),

    #[error("Adapter not ready: {}", _0)]
    NotReady(String),

    #[error("Operation already in progress: {}", _0)]
    InProgress(String),

    #[error("Not authorized: {}", _0)]
    NotAuthorized(String),

    #[error("Permission denied: {}", _0)]
    PermissionDenied(String),

    #[error("Unexpected reply: {}", _0)]
    UnexpectedReply(String),

    #[error("Error: {}", _0)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

const START_HINT: &str = "start bluetoothd, e.g. `systemctl start bluetooth`";

fn adapter_not_found(selector: Option<&str>) -> String {
    match selector {
        Some(selector) => format!("Adapter `{}` not found", selector),
        None => "Bluetooth adapter not found".to_string(),
    }
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        let detail = fault.message.clone().unwrap_or_else(|| fault.name.clone());
        match fault.name.as_str() {
            FAULT_SERVICE_UNKNOWN | FAULT_NAME_HAS_NO_OWNER => {
                Error::ServiceUnavailable(format!(
                    "{} is not running on the system bus ({}); {}",
                    BLUEZ_SERVICE, detail, START_HINT
                ))
            }
            FAULT_NOT_READY => Error::NotReady(detail),
            FAULT_IN_PROGRESS => Error::InProgress(detail),
            FAULT_NOT_AUTHORIZED => Error::NotAuthorized(detail),
            FAULT_ACCESS_DENIED => Error::PermissionDenied(detail),
            _ => Error::Transport(match fault.message {
                Some(message) => format!("{}: {}", fault.name, message),
                None => fault.name,
            }),
        }
    }
}

/// Convenience type for a result using the bluez-locate [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_unknown_is_service_unavailable() {
        let err: Error =
            Fault::new(FAULT_SERVICE_UNKNOWN, "The name org.bluez was not provided").into();
        assert!(matches!(err, Error::ServiceUnavailable(ref hint) if hint.contains("bluetoothd")));
    }

    #[test]
    fn name_has_no_owner_is_service_unavailable() {
        let err: Error = Fault::new(FAULT_NAME_HAS_NO_OWNER, "Could not get owner of name").into();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[test]
    fn unknown_fault_keeps_original_message() {
        let err: Error =
            Fault::new("org.freedesktop.DBus.Error.NoReply", "Did not receive a reply").into();
        match err {
            Error::Transport(message) => {
                assert_eq!(
                    message,
                    "org.freedesktop.DBus.Error.NoReply: Did not receive a reply"
                );
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn bluez_method_faults_are_categorized() {
        assert!(matches!(
            Error::from(Fault::new(FAULT_NOT_READY, "Resource Not Ready")),
            Error::NotReady(_)
        ));
        assert!(matches!(
            Error::from(Fault::new(FAULT_IN_PROGRESS, "Operation already in progress")),
            Error::InProgress(_)
        ));
        assert!(matches!(
            Error::from(Fault::new(FAULT_NOT_AUTHORIZED, "Operation Not Authorized")),
            Error::NotAuthorized(_)
        ));
        assert!(matches!(
            Error::from(Fault::new(FAULT_ACCESS_DENIED, "Rejected send message")),
            Error::PermissionDenied(_)
        ));
    }

    #[test]
    fn adapter_not_found_messages() {
        assert_eq!(
            Error::AdapterNotFound(None).to_string(),
            "Bluetooth adapter not found"
        );
        assert_eq!(
            Error::AdapterNotFound(Some("hci3".into())).to_string(),
            "Adapter `hci3` not found"
        );
    }
}
