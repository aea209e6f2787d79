use super::PropertyValue;
use std::collections::HashMap;

/// Property name to value, for one interface of one object.
pub type PropertyMap = HashMap<String, PropertyValue>;

/// Interface name to its properties, for one object.
pub type InterfaceMap = HashMap<String, PropertyMap>;

/// A snapshot of every object the BlueZ object manager exposes.
///
/// Entries keep the order they were inserted in, which is the order every
/// lookup walks them in. Inserting a path that is already present replaces its
/// interfaces but keeps its position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManagedObjects {
    entries: Vec<(String, InterfaceMap)>,
}

impl ManagedObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, interfaces: InterfaceMap) {
        let path = path.into();
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some((_, existing)) => *existing = interfaces,
            None => self.entries.push((path, interfaces)),
        }
    }

    /// Builder-style variant of [`ManagedObjects::insert`] for a single interface.
    pub fn with_object<I, K, V>(mut self, path: &str, interface: &str, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        let properties: PropertyMap = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        match self.entries.iter_mut().find(|(p, _)| p == path) {
            Some((_, interfaces)) => {
                interfaces.insert(interface.to_owned(), properties);
            }
            None => {
                let mut interfaces = InterfaceMap::new();
                interfaces.insert(interface.to_owned(), properties);
                self.entries.push((path.to_owned(), interfaces));
            }
        }
        self
    }

    pub fn get(&self, path: &str) -> Option<&InterfaceMap> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, interfaces)| interfaces)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InterfaceMap)> {
        self.entries.iter().map(|(p, i)| (p.as_str(), i))
    }

    /// Every object exposing `interface`, with that interface's properties.
    pub fn with_interface<'a>(
        &'a self,
        interface: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a PropertyMap)> + 'a {
        self.iter().filter_map(move |(path, interfaces)| {
            interfaces.get(interface).map(|props| (path, props))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, InterfaceMap)> for ManagedObjects {
    fn from_iter<T: IntoIterator<Item = (String, InterfaceMap)>>(iter: T) -> Self {
        let mut objects = ManagedObjects::new();
        for (path, interfaces) in iter {
            objects.insert(path, interfaces);
        }
        objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ADAPTER_INTERFACE, DEVICE_INTERFACE};

    #[test]
    fn keeps_insertion_order() {
        let objects = ManagedObjects::new()
            .with_object("/org/bluez/hci1", ADAPTER_INTERFACE, [("Address", "11:11:11:11:11:11")])
            .with_object("/org/bluez/hci0", ADAPTER_INTERFACE, [("Address", "00:00:00:00:00:00")]);
        let paths: Vec<_> = objects.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["/org/bluez/hci1", "/org/bluez/hci0"]);
    }

    #[test]
    fn reinsert_replaces_in_place() {
        let mut objects = ManagedObjects::new()
            .with_object("/a", ADAPTER_INTERFACE, [("Address", "1")])
            .with_object("/b", ADAPTER_INTERFACE, [("Address", "2")]);
        objects.insert("/a", InterfaceMap::new());
        assert_eq!(objects.len(), 2);
        assert_eq!(objects.iter().next().map(|(p, _)| p), Some("/a"));
        assert!(objects.get("/a").map_or(false, |i| i.is_empty()));
    }

    #[test]
    fn filters_by_interface() {
        let objects = ManagedObjects::new()
            .with_object("/org/bluez", "org.bluez.AgentManager1", Vec::<(&str, &str)>::new())
            .with_object("/org/bluez/hci0", ADAPTER_INTERFACE, [("Address", "AA:BB:CC:DD:EE:FF")])
            .with_object(
                "/org/bluez/hci0/dev_11_22_33_44_55_66",
                DEVICE_INTERFACE,
                [("Address", "11:22:33:44:55:66")],
            );
        let adapters: Vec<_> = objects.with_interface(ADAPTER_INTERFACE).map(|(p, _)| p).collect();
        assert_eq!(adapters, vec!["/org/bluez/hci0"]);
    }
}
