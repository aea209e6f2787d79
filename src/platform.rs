//! The `platform` module re-exports the native [`api::Transport`] for the current
//! target. BlueZ only exists on Linux; elsewhere only the in-memory transport is
//! available.

#[cfg(target_os = "linux")]
pub use crate::bluez::{DbusTransport as Transport, TransportConfig};

use crate::api::{self, AdapterHandle, DeviceHandle, DeviceInfo, ManagedObjects, RemoteObject};
use crate::memory::MemoryTransport;
use crate::resolver::AdapterResolver;
use static_assertions::assert_impl_all;
use std::{fmt::Debug, hash::Hash};

// Ensure that the exported types implement all the expected traits.
#[cfg(target_os = "linux")]
assert_impl_all!(Transport: api::Transport, Clone, Debug, Send, Sized, Sync);
assert_impl_all!(MemoryTransport: api::Transport, Clone, Debug, Default, Send, Sync);
assert_impl_all!(AdapterResolver<MemoryTransport>: Clone, Debug, Send, Sync);
assert_impl_all!(AdapterHandle: RemoteObject, Clone, Debug, Eq, Hash, Ord, Send, Sync);
assert_impl_all!(DeviceHandle: RemoteObject, Clone, Debug, Eq, Hash, Ord, Send, Sync);
assert_impl_all!(DeviceInfo: Clone, Debug, Send, Sync);
assert_impl_all!(ManagedObjects: Clone, Debug, Default, Send, Sync);
assert_impl_all!(crate::Error: std::error::Error, Send, Sync);
