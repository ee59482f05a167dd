//! Host object model for marshalled values

use std::fmt;
use bytes::Bytes;

/// Boxed host type of a value (and element type of object arrays)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Null,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    /// Epoch milliseconds
    Date,
    String,
    ByteArray,
    BooleanArray,
    ObjectArray,
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostType::Null => "null",
            HostType::Byte => "Byte",
            HostType::Short => "Short",
            HostType::Int => "Integer",
            HostType::Long => "Long",
            HostType::Float => "Float",
            HostType::Double => "Double",
            HostType::Boolean => "Boolean",
            HostType::Date => "Date",
            HostType::String => "String",
            HostType::ByteArray => "byte[]",
            HostType::BooleanArray => "boolean[]",
            HostType::ObjectArray => "Object[]",
        };
        f.write_str(name)
    }
}

/// A value in the host's object model
#[derive(Clone, Debug, PartialEq)]
pub enum HostValue {
    Null,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    /// Milliseconds since the Unix epoch
    Date(i64),
    String(String),
    ByteArray(Bytes),
    BooleanArray(Vec<bool>),
    /// Array of boxed values sharing one element type
    ObjectArray { element: HostType, items: Vec<HostValue> },
}

impl HostValue {
    pub fn host_type(&self) -> HostType {
        match self {
            HostValue::Null => HostType::Null,
            HostValue::Byte(_) => HostType::Byte,
            HostValue::Short(_) => HostType::Short,
            HostValue::Int(_) => HostType::Int,
            HostValue::Long(_) => HostType::Long,
            HostValue::Float(_) => HostType::Float,
            HostValue::Double(_) => HostType::Double,
            HostValue::Boolean(_) => HostType::Boolean,
            HostValue::Date(_) => HostType::Date,
            HostValue::String(_) => HostType::String,
            HostValue::ByteArray(_) => HostType::ByteArray,
            HostValue::BooleanArray(_) => HostType::BooleanArray,
            HostValue::ObjectArray { .. } => HostType::ObjectArray,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// Integral value widened to i64 (dates included)
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            HostValue::Byte(v) => Some(v.into()),
            HostValue::Short(v) => Some(v.into()),
            HostValue::Int(v) => Some(v.into()),
            HostValue::Long(v) | HostValue::Date(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Element count for array values
    pub fn array_len(&self) -> Option<usize> {
        match self {
            HostValue::ByteArray(bytes) => Some(bytes.len()),
            HostValue::BooleanArray(values) => Some(values.len()),
            HostValue::ObjectArray { items, .. } => Some(items.len()),
            _ => None,
        }
    }
}
