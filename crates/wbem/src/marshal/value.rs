//! Scalar VARIANT conversion
//!
//! | VARIANT          | Host value                  |
//! |------------------|-----------------------------|
//! | EMPTY, NULL, VOID| null                        |
//! | I1               | Byte                        |
//! | UI1, I2          | Short                       |
//! | UI2, I4, INT     | Integer                     |
//! | UI4, UINT, I8    | Long                        |
//! | UI8              | Long (bit pattern kept)     |
//! | R4 / R8          | Float / Double              |
//! | BOOL             | Boolean                     |
//! | DATE             | Date                        |
//! | BSTR             | String, or Date for CIM datetime |

use crate::host::HostValue;
use crate::types::{CimType, Result, VarType, Variant, WbemError};
use super::arrays::convert_array;
use super::datetime::{cim_datetime_to_millis, ole_date_to_millis};

/// Convert a native value to the host object model
///
/// `cim_type` is the provider's type hint for the property; it only
/// matters for string values holding CIM datetime text.
pub fn convert(value: &Variant, cim_type: CimType) -> Result<HostValue> {
    let host = match value {
        Variant::Empty | Variant::Null => HostValue::Null,
        Variant::I1(v) => HostValue::Byte(*v),
        Variant::UI1(v) => HostValue::Short(i16::from(*v)),
        Variant::I2(v) => HostValue::Short(*v),
        Variant::UI2(v) => HostValue::Int(i32::from(*v)),
        Variant::I4(v) | Variant::Int(v) => HostValue::Int(*v),
        Variant::UI4(v) | Variant::UInt(v) => HostValue::Long(i64::from(*v)),
        Variant::I8(v) => HostValue::Long(*v),
        // No wider signed host type; values above i64::MAX wrap
        Variant::UI8(v) => HostValue::Long(*v as i64),
        Variant::R4(v) => HostValue::Float(*v),
        Variant::R8(v) => HostValue::Double(*v),
        Variant::Bool(v) => HostValue::Boolean(*v),
        Variant::Date(v) => HostValue::Date(ole_date_to_millis(*v)),
        Variant::BStr(s) if cim_type.is_datetime() => HostValue::Date(cim_datetime_to_millis(s)),
        Variant::BStr(s) => HostValue::String(s.clone()),
        Variant::Array(array) => return convert_array(array, cim_type),
        Variant::Other(vt) if is_null_tag(*vt) => HostValue::Null,
        Variant::Other(vt) => return Err(WbemError::unsupported(*vt)),
    };
    Ok(host)
}

fn is_null_tag(vt: VarType) -> bool {
    !vt.is_array() && matches!(vt.base(), VarType::EMPTY | VarType::NULL | VarType::VOID)
}
