// bluez-locate Source Code File
//
// Copyright 2020 Nonpolynomial Labs LLC. All rights reserved.
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use crate::api::{Fault, InterfaceMap, PropertyValue};
use crate::{Error, Result};
use dbus::arg::{ArgType, PropMap, RefArg, Variant};
use dbus::strings::Path;
use std::collections::{BTreeMap, HashMap};

impl From<dbus::Error> for Error {
    fn from(e: dbus::Error) -> Self {
        Fault {
            name: e
                .name()
                .unwrap_or("org.freedesktop.DBus.Error.Failed")
                .to_owned(),
            message: e.message().map(str::to_owned),
        }
        .into()
    }
}

/// Convert the interfaces of one `GetManagedObjects` entry.
pub(super) fn interfaces(interfaces: HashMap<String, PropMap>) -> InterfaceMap {
    interfaces
        .into_iter()
        .map(|(interface, props)| {
            let props = props
                .iter()
                .map(|(name, value)| (name.clone(), from_refarg(&*value.0)))
                .collect();
            (interface, props)
        })
        .collect()
}

pub(super) fn from_refarg(arg: &dyn RefArg) -> PropertyValue {
    match arg.arg_type() {
        ArgType::Boolean => PropertyValue::Bool(arg.as_u64().map_or(false, |b| b != 0)),
        ArgType::Byte | ArgType::UInt16 | ArgType::UInt32 | ArgType::UInt64 => {
            PropertyValue::UInt(arg.as_u64().unwrap_or_default())
        }
        ArgType::Int16 | ArgType::Int32 | ArgType::Int64 => {
            PropertyValue::Int(arg.as_i64().unwrap_or_default())
        }
        ArgType::Double => PropertyValue::Double(arg.as_f64().unwrap_or_default()),
        ArgType::String | ArgType::Signature => {
            PropertyValue::String(arg.as_str().unwrap_or_default().to_owned())
        }
        ArgType::ObjectPath => {
            PropertyValue::ObjectPath(arg.as_str().unwrap_or_default().to_owned())
        }
        ArgType::Variant => match arg.as_iter().and_then(|mut inner| inner.next()) {
            Some(inner) => PropertyValue::variant(from_refarg(inner)),
            None => PropertyValue::Unsupported(arg.signature().to_string()),
        },
        ArgType::Array => array(arg),
        ArgType::Struct => match arg.as_iter() {
            Some(fields) => PropertyValue::Array(fields.map(from_refarg).collect()),
            None => PropertyValue::Unsupported(arg.signature().to_string()),
        },
        _ => PropertyValue::Unsupported(arg.signature().to_string()),
    }
}

fn array(arg: &dyn RefArg) -> PropertyValue {
    let signature = arg.signature().to_string();
    let items = match arg.as_iter() {
        Some(items) => items,
        None => return PropertyValue::Unsupported(signature),
    };
    if signature == "ay" {
        PropertyValue::Bytes(items.filter_map(|b| b.as_u64()).map(|b| b as u8).collect())
    } else if signature.starts_with("a{") {
        // Dictionaries iterate as key, value, key, value...
        let mut entries = BTreeMap::new();
        let mut items = items;
        while let (Some(key), Some(value)) = (items.next(), items.next()) {
            let key = match from_refarg(key) {
                PropertyValue::String(s) | PropertyValue::ObjectPath(s) => s,
                other => other.to_string(),
            };
            entries.insert(key, from_refarg(value).flatten().clone());
        }
        PropertyValue::Dict(entries)
    } else {
        PropertyValue::Array(items.map(from_refarg).collect())
    }
}

/// Convert a value into something the `dbus` crate can append to a message.
pub(super) fn to_refarg(value: &PropertyValue) -> Result<Box<dyn RefArg>> {
    let arg: Box<dyn RefArg> = match value {
        PropertyValue::Bool(b) => Box::new(*b),
        PropertyValue::Int(i) => Box::new(*i),
        PropertyValue::UInt(u) => Box::new(*u),
        PropertyValue::Double(d) => Box::new(*d),
        PropertyValue::String(s) => Box::new(s.clone()),
        PropertyValue::ObjectPath(p) => Box::new(object_path(p)?),
        PropertyValue::Bytes(bytes) => Box::new(bytes.clone()),
        PropertyValue::Array(items) => array_refarg(items)?,
        PropertyValue::Dict(entries) => Box::new(
            entries
                .iter()
                .map(|(k, v)| -> Result<_> { Ok((k.clone(), Variant(to_refarg(v)?))) })
                .collect::<Result<PropMap>>()?,
        ),
        PropertyValue::Variant(inner) => Box::new(Variant(to_refarg(inner)?)),
        PropertyValue::Unsupported(signature) => {
            return Err(Error::UnexpectedReply(format!(
                "cannot send a value of signature {}",
                signature
            )))
        }
    };
    Ok(arg)
}

fn object_path(path: &str) -> Result<Path<'static>> {
    Path::new(path.to_owned()).map_err(Error::Transport)
}

fn all_of<'a, U>(
    items: &'a [PropertyValue],
    f: impl Fn(&'a PropertyValue) -> Option<U>,
) -> Option<Vec<U>> {
    items.iter().map(f).collect()
}

// Homogeneous arrays keep their element type (`as`, `ao`, `ab`, ...); mixed ones go out as `av`.
// An empty array has no element to go by and is sent as `as`.
fn array_refarg(items: &[PropertyValue]) -> Result<Box<dyn RefArg>> {
    use PropertyValue::*;

    if let Some(strings) = all_of(items, |i| match i {
        String(s) => Some(s.clone()),
        _ => None,
    }) {
        return Ok(Box::new(strings));
    }
    if let Some(paths) = all_of(items, |i| match i {
        ObjectPath(p) => Some(p.as_str()),
        _ => None,
    }) {
        let paths = paths
            .into_iter()
            .map(object_path)
            .collect::<Result<Vec<_>>>()?;
        return Ok(Box::new(paths));
    }
    if let Some(flags) = all_of(items, |i| match i {
        Bool(b) => Some(*b),
        _ => None,
    }) {
        return Ok(Box::new(flags));
    }
    if let Some(ints) = all_of(items, |i| match i {
        Int(n) => Some(*n),
        _ => None,
    }) {
        return Ok(Box::new(ints));
    }
    if let Some(uints) = all_of(items, |i| match i {
        UInt(n) => Some(*n),
        _ => None,
    }) {
        return Ok(Box::new(uints));
    }
    if let Some(doubles) = all_of(items, |i| match i {
        Double(d) => Some(*d),
        _ => None,
    }) {
        return Ok(Box::new(doubles));
    }
    if let Some(blobs) = all_of(items, |i| match i {
        Bytes(b) => Some(b.clone()),
        _ => None,
    }) {
        return Ok(Box::new(blobs));
    }
    let variants = items
        .iter()
        .map(|item| to_refarg(item).map(dbus::arg::Variant))
        .collect::<Result<Vec<_>>>()?;
    Ok(Box::new(variants))
}
