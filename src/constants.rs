// Well-known BlueZ names.
pub const BLUEZ_SERVICE: &str = "org.bluez";
pub const BLUEZ_ROOT_PATH: &str = "/org/bluez";
pub const ADAPTER_INTERFACE: &str = "org.bluez.Adapter1";
pub const DEVICE_INTERFACE: &str = "org.bluez.Device1";

// freedesktop standard interfaces.
pub const OBJECT_MANAGER_INTERFACE: &str = "org.freedesktop.DBus.ObjectManager";
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

// Error names carried by D-Bus error replies.
pub const FAULT_SERVICE_UNKNOWN: &str = "org.freedesktop.DBus.Error.ServiceUnknown";
pub const FAULT_NAME_HAS_NO_OWNER: &str = "org.freedesktop.DBus.Error.NameHasNoOwner";
pub const FAULT_ACCESS_DENIED: &str = "org.freedesktop.DBus.Error.AccessDenied";
pub const FAULT_NOT_READY: &str = "org.bluez.Error.NotReady";
pub const FAULT_IN_PROGRESS: &str = "org.bluez.Error.InProgress";
pub const FAULT_NOT_AUTHORIZED: &str = "org.bluez.Error.NotAuthorized";
