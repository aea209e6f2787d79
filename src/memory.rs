//! An in-memory [`Transport`] backed by a fixed registry snapshot.
//!
//! Useful for exercising resolution and handle calls without a running
//! bluetoothd. Faults can be injected per method, every invocation is
//! recorded, and `org.freedesktop.DBus.Properties` calls are answered from the
//! registry itself.

use crate::api::{Fault, ManagedObjects, PropertyValue, Transport};
use crate::{Error, Result, PROPERTIES_INTERFACE};
use async_trait::async_trait;
use log::trace;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One recorded [`Transport::invoke`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub path: String,
    pub interface: String,
    pub method: String,
    pub args: Vec<PropertyValue>,
}

#[derive(Debug, Default)]
struct State {
    objects: ManagedObjects,
    fetches: usize,
    fetch_fault: Option<Fault>,
    method_faults: HashMap<String, Fault>,
    replies: HashMap<String, Vec<PropertyValue>>,
    calls: Vec<Call>,
}

/// A cloneable in-memory registry. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
}

impl MemoryTransport {
    pub fn new(objects: ManagedObjects) -> Self {
        MemoryTransport {
            state: Arc::new(Mutex::new(State {
                objects,
                ..State::default()
            })),
        }
    }

    /// Replace the registry seen by subsequent fetches.
    pub fn set_objects(&self, objects: ManagedObjects) {
        self.state.lock().unwrap().objects = objects;
    }

    /// Make every registry fetch fail with `fault` until [`MemoryTransport::clear_faults`].
    pub fn fail_fetch(&self, fault: Fault) {
        self.state.lock().unwrap().fetch_fault = Some(fault);
    }

    /// Make calls to `method` fail with `fault`, whatever the interface.
    pub fn fail_method(&self, method: &str, fault: Fault) {
        self.state
            .lock()
            .unwrap()
            .method_faults
            .insert(method.to_owned(), fault);
    }

    pub fn clear_faults(&self) {
        let mut state = self.state.lock().unwrap();
        state.fetch_fault = None;
        state.method_faults.clear();
    }

    /// Answer calls to `method` with `reply`.
    pub fn reply(&self, method: &str, reply: Vec<PropertyValue>) {
        self.state
            .lock()
            .unwrap()
            .replies
            .insert(method.to_owned(), reply);
    }

    /// Number of registry fetches served so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl State {
    fn properties_call(
        &mut self,
        path: &str,
        method: &str,
        args: &[PropertyValue],
    ) -> Result<Vec<PropertyValue>> {
        let interface = args.first().and_then(|a| a.as_str()).unwrap_or_default();
        let unknown = || Error::from(Fault::new(
            "org.freedesktop.DBus.Error.UnknownObject",
            format!("No such object or interface {} on {}", interface, path),
        ));
        match method {
            "Get" => {
                let name = args.get(1).and_then(|a| a.as_str()).unwrap_or_default();
                let value = self
                    .objects
                    .get(path)
                    .and_then(|i| i.get(interface))
                    .and_then(|p| p.get(name))
                    .cloned()
                    .ok_or_else(|| {
                        Error::from(Fault::new(
                            "org.freedesktop.DBus.Error.InvalidArgs",
                            format!("No such property '{}'", name),
                        ))
                    })?;
                Ok(vec![PropertyValue::variant(value)])
            }
            "GetAll" => {
                let props = self
                    .objects
                    .get(path)
                    .and_then(|i| i.get(interface))
                    .ok_or_else(unknown)?;
                Ok(vec![PropertyValue::Dict(
                    props
                        .iter()
                        .map(|(k, v)| (k.clone(), PropertyValue::variant(v.clone())))
                        .collect(),
                )])
            }
            "Set" => {
                let name = args.get(1).and_then(|a| a.as_str()).unwrap_or_default().to_owned();
                let value = args
                    .get(2)
                    .map(|v| v.flatten().clone())
                    .unwrap_or(PropertyValue::Unsupported(String::new()));
                let mut interfaces = self.objects.get(path).cloned().ok_or_else(unknown)?;
                interfaces
                    .entry(interface.to_owned())
                    .or_default()
                    .insert(name, value);
                self.objects.insert(path, interfaces);
                Ok(Vec::new())
            }
            _ => Err(Error::from(Fault::new(
                "org.freedesktop.DBus.Error.UnknownMethod",
                format!("Unknown method {}", method),
            ))),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn managed_objects(&self) -> Result<ManagedObjects> {
        let mut state = self.state.lock().unwrap();
        state.fetches += 1;
        if let Some(fault) = state.fetch_fault.clone() {
            return Err(fault.into());
        }
        Ok(state.objects.clone())
    }

    async fn invoke(
        &self,
        path: &str,
        interface: &str,
        method: &str,
        args: Vec<PropertyValue>,
    ) -> Result<Vec<PropertyValue>> {
        trace!("memory invoke {}.{} on {}", interface, method, path);
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            path: path.to_owned(),
            interface: interface.to_owned(),
            method: method.to_owned(),
            args: args.clone(),
        });
        if let Some(fault) = state.method_faults.get(method) {
            return Err(fault.clone().into());
        }
        if let Some(reply) = state.replies.get(method) {
            return Ok(reply.clone());
        }
        if interface == PROPERTIES_INTERFACE {
            return state.properties_call(path, method, &args);
        }
        Ok(Vec::new())
    }
}
