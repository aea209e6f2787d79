//! Dynamically typed D-Bus values as they appear in the BlueZ registry.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// A single D-Bus value.
///
/// Integers of every width are widened to [`PropertyValue::Int`] or
/// [`PropertyValue::UInt`]; `ay` arrays become [`PropertyValue::Bytes`].
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    String(String),
    ObjectPath(String),
    Bytes(Vec<u8>),
    Array(Vec<PropertyValue>),
    Dict(BTreeMap<String, PropertyValue>),
    Variant(Box<PropertyValue>),
    /// A value whose D-Bus signature has no representation here.
    Unsupported(String),
}

impl PropertyValue {
    /// Wrap a value in a D-Bus variant, as `Properties.Set` expects.
    pub fn variant(value: impl Into<PropertyValue>) -> Self {
        PropertyValue::Variant(Box::new(value.into()))
    }

    /// Unwrap any number of variant layers.
    pub fn flatten(&self) -> &PropertyValue {
        match self {
            PropertyValue::Variant(inner) => inner.flatten(),
            other => other,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.flatten() {
            PropertyValue::String(s) | PropertyValue::ObjectPath(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.flatten() {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self.flatten() {
            PropertyValue::Int(i) => Some(i),
            PropertyValue::UInt(u) => i64::try_from(u).ok(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self.flatten() {
            PropertyValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::UInt(u) => write!(f, "{}", u),
            PropertyValue::Double(d) => write!(f, "{}", d),
            PropertyValue::String(s) | PropertyValue::ObjectPath(s) => write!(f, "{}", s),
            PropertyValue::Bytes(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            PropertyValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            PropertyValue::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            PropertyValue::Variant(inner) => write!(f, "{}", inner),
            PropertyValue::Unsupported(signature) => write!(f, "<{}>", signature),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i16> for PropertyValue {
    fn from(i: i16) -> Self {
        PropertyValue::Int(i.into())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<u32> for PropertyValue {
    fn from(u: u32) -> Self {
        PropertyValue::UInt(u.into())
    }
}

impl From<u64> for PropertyValue {
    fn from(u: u64) -> Self {
        PropertyValue::UInt(u)
    }
}

impl From<f64> for PropertyValue {
    fn from(d: f64) -> Self {
        PropertyValue::Double(d)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(bytes: Vec<u8>) -> Self {
        PropertyValue::Bytes(bytes)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(items: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(items)
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(items: Vec<&str>) -> Self {
        PropertyValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(items: Vec<String>) -> Self {
        PropertyValue::Array(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_layers_are_transparent_to_accessors() {
        let value = PropertyValue::variant(PropertyValue::variant("hci0"));
        assert_eq!(value.as_str(), Some("hci0"));
        assert_eq!(PropertyValue::variant(true).as_bool(), Some(true));
        assert_eq!(PropertyValue::variant(-65i16).as_i64(), Some(-65));
    }

    #[test]
    fn accessors_reject_other_types() {
        assert_eq!(PropertyValue::Bool(true).as_str(), None);
        assert_eq!(PropertyValue::from("yes").as_bool(), None);
        assert_eq!(PropertyValue::UInt(u64::MAX).as_i64(), None);
    }

    #[test]
    fn display_formats() {
        assert_eq!(PropertyValue::Bytes(vec![0x0a, 0xff]).to_string(), "0aff");
        assert_eq!(
            PropertyValue::from(vec!["a", "b"]).to_string(),
            "[a, b]"
        );
    }
}
