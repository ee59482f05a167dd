//! SAFEARRAY decoding
//!
//! Decoding is table-driven on the element type:
//!
//! | Element               | Host value            |
//! |-----------------------|-----------------------|
//! | UI1, I1               | byte array            |
//! | BOOL                  | boolean array         |
//! | BSTR                  | object array (String, or Date for CIM datetime) |
//! | I2 .. R8 numerics     | not supported         |
//!
//! Anything else (VARIANT, nested arrays, DECIMAL, ...) is not supported
//! either. No decoder ever returns a partially filled array.

use bytes::{Buf, Bytes};
use crate::host::{HostType, HostValue};
use crate::types::{CimType, Result, SafeArray, SafeArrayData, VarType, Variant, WbemError};
use super::value::convert;

type ArrayDecoder = fn(&SafeArray, CimType) -> Result<HostValue>;

const ARRAY_DECODERS: [(VarType, ArrayDecoder); 14] = [
    (VarType::UI1, decode_byte_array),
    (VarType::I1, decode_byte_array),
    (VarType::BOOL, decode_boolean_array),
    (VarType::I2, unsupported_array),
    (VarType::UI2, unsupported_array),
    (VarType::I4, unsupported_array),
    (VarType::UI4, unsupported_array),
    (VarType::INT, unsupported_array),
    (VarType::UINT, unsupported_array),
    (VarType::I8, unsupported_array),
    (VarType::UI8, unsupported_array),
    (VarType::R4, unsupported_array),
    (VarType::R8, unsupported_array),
    (VarType::BSTR, decode_object_array),
];

/// Convert a SAFEARRAY to a host array
pub fn convert_array(array: &SafeArray, cim_type: CimType) -> Result<HostValue> {
    let element = array.element_type();
    if element.is_array() || element.0 & VarType::BYREF != 0 {
        return Err(WbemError::unsupported_array(element));
    }

    match ARRAY_DECODERS.iter().find(|(vt, _)| *vt == element) {
        Some((_, decode)) => decode(array, cim_type),
        None => Err(WbemError::unsupported_array(element)),
    }
}

fn unsupported_array(array: &SafeArray, _cim_type: CimType) -> Result<HostValue> {
    Err(WbemError::unsupported_array(array.element_type()))
}

/// Raw storage covering exactly `len` elements of `size` bytes
fn raw_elements(array: &SafeArray, size: usize) -> Result<Bytes> {
    let raw = match array.data() {
        SafeArrayData::Raw(raw) => raw,
        SafeArrayData::Strings(_) => {
            return Err(WbemError::UnsupportedType {
                vt: array.element_type(),
                detail: "array storage does not match element type",
            })
        }
    };

    let needed = array.len() * size;
    if raw.len() < needed {
        return Err(WbemError::BufferUnderflow {
            needed,
            have: raw.len(),
        });
    }
    Ok(raw.slice(..needed))
}

fn decode_byte_array(array: &SafeArray, _cim_type: CimType) -> Result<HostValue> {
    Ok(HostValue::ByteArray(raw_elements(array, 1)?))
}

fn decode_boolean_array(array: &SafeArray, _cim_type: CimType) -> Result<HostValue> {
    let mut raw = raw_elements(array, 2)?;
    let mut values = Vec::with_capacity(array.len());
    while raw.has_remaining() {
        // VARIANT_BOOL: 0 is false, anything else (normally -1) is true
        values.push(raw.get_i16_le() != 0);
    }
    Ok(HostValue::BooleanArray(values))
}

fn decode_object_array(array: &SafeArray, cim_type: CimType) -> Result<HostValue> {
    let strings = match array.data() {
        SafeArrayData::Strings(strings) => strings,
        SafeArrayData::Raw(_) => {
            return Err(WbemError::UnsupportedType {
                vt: array.element_type(),
                detail: "array storage does not match element type",
            })
        }
    };

    let len = array.len();
    if strings.len() < len {
        return Err(WbemError::ArraySizeMismatch {
            expected: len,
            got: strings.len(),
        });
    }

    let element_hint = cim_type.base();
    let element = if element_hint.is_datetime() {
        HostType::Date
    } else {
        HostType::String
    };

    let items = strings[..len]
        .iter()
        .map(|s| convert(&Variant::BStr(s.clone()), element_hint))
        .collect::<Result<Vec<_>>>()?;

    Ok(HostValue::ObjectArray { element, items })
}
