//! Native dynamic values: VARIANT, SAFEARRAY and CIM type hints
//!
//! Raw SAFEARRAY storage for fixed-size elements is kept as little-endian
//! bytes, exactly as the provider lays it out.
//!
//! | VarType  | Element size | Encoding                    |
//! |----------|--------------|-----------------------------|
//! | I1, UI1  | 1            | byte                        |
//! | I2, UI2  | 2            | LE 16-bit                   |
//! | BOOL     | 2            | VARIANT_BOOL (-1 / 0)       |
//! | I4, UI4  | 4            | LE 32-bit                   |
//! | INT, UINT| 4            | LE 32-bit                   |
//! | R4       | 4            | LE IEEE-754 single          |
//! | I8, UI8  | 8            | LE 64-bit                   |
//! | R8, DATE | 8            | LE IEEE-754 double          |

use std::fmt;
use bytes::{BufMut, Bytes, BytesMut};

/// VARIANT type tag (VARTYPE)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VarType(pub u16);

impl VarType {
    pub const EMPTY: VarType = VarType(0);
    pub const NULL: VarType = VarType(1);
    pub const I2: VarType = VarType(2);
    pub const I4: VarType = VarType(3);
    pub const R4: VarType = VarType(4);
    pub const R8: VarType = VarType(5);
    pub const CY: VarType = VarType(6);
    pub const DATE: VarType = VarType(7);
    pub const BSTR: VarType = VarType(8);
    pub const DISPATCH: VarType = VarType(9);
    pub const ERROR: VarType = VarType(10);
    pub const BOOL: VarType = VarType(11);
    pub const VARIANT: VarType = VarType(12);
    pub const UNKNOWN: VarType = VarType(13);
    pub const DECIMAL: VarType = VarType(14);
    pub const I1: VarType = VarType(16);
    pub const UI1: VarType = VarType(17);
    pub const UI2: VarType = VarType(18);
    pub const UI4: VarType = VarType(19);
    pub const I8: VarType = VarType(20);
    pub const UI8: VarType = VarType(21);
    pub const INT: VarType = VarType(22);
    pub const UINT: VarType = VarType(23);
    pub const VOID: VarType = VarType(24);

    /// Array modifier bit
    pub const ARRAY: u16 = 0x2000;
    /// By-reference modifier bit
    pub const BYREF: u16 = 0x4000;

    /// Tag with the array bit set
    pub fn array_of(element: VarType) -> VarType {
        VarType(element.0 | Self::ARRAY)
    }

    pub fn is_array(self) -> bool {
        self.0 & Self::ARRAY != 0
    }

    /// Tag without modifier bits
    pub fn base(self) -> VarType {
        VarType(self.0 & !(Self::ARRAY | Self::BYREF))
    }

    /// Size of one element in raw SAFEARRAY storage
    pub fn element_size(self) -> Option<usize> {
        match self {
            Self::I1 | Self::UI1 => Some(1),
            Self::I2 | Self::UI2 | Self::BOOL => Some(2),
            Self::I4 | Self::UI4 | Self::INT | Self::UINT | Self::R4 | Self::ERROR => Some(4),
            Self::I8 | Self::UI8 | Self::R8 | Self::DATE | Self::CY => Some(8),
            _ => None,
        }
    }

    fn name(self) -> Option<&'static str> {
        let name = match self.base() {
            Self::EMPTY => "VT_EMPTY",
            Self::NULL => "VT_NULL",
            Self::I2 => "VT_I2",
            Self::I4 => "VT_I4",
            Self::R4 => "VT_R4",
            Self::R8 => "VT_R8",
            Self::CY => "VT_CY",
            Self::DATE => "VT_DATE",
            Self::BSTR => "VT_BSTR",
            Self::DISPATCH => "VT_DISPATCH",
            Self::ERROR => "VT_ERROR",
            Self::BOOL => "VT_BOOL",
            Self::VARIANT => "VT_VARIANT",
            Self::UNKNOWN => "VT_UNKNOWN",
            Self::DECIMAL => "VT_DECIMAL",
            Self::I1 => "VT_I1",
            Self::UI1 => "VT_UI1",
            Self::UI2 => "VT_UI2",
            Self::UI4 => "VT_UI4",
            Self::I8 => "VT_I8",
            Self::UI8 => "VT_UI8",
            Self::INT => "VT_INT",
            Self::UINT => "VT_UINT",
            Self::VOID => "VT_VOID",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarType({})", self)
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 & Self::BYREF != 0 {
            f.write_str("VT_BYREF|")?;
        }
        if self.is_array() {
            f.write_str("VT_ARRAY|")?;
        }
        match self.name() {
            Some(name) => write!(f, "{} (0x{:04x})", name, self.0),
            None => write!(f, "0x{:04x}", self.0),
        }
    }
}

/// CIM type hint (CIMTYPE) reported by the provider next to a property value
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct CimType(pub i32);

impl CimType {
    pub const EMPTY: CimType = CimType(0);
    pub const SINT16: CimType = CimType(2);
    pub const SINT32: CimType = CimType(3);
    pub const REAL32: CimType = CimType(4);
    pub const REAL64: CimType = CimType(5);
    pub const STRING: CimType = CimType(8);
    pub const BOOLEAN: CimType = CimType(11);
    pub const OBJECT: CimType = CimType(13);
    pub const SINT8: CimType = CimType(16);
    pub const UINT8: CimType = CimType(17);
    pub const UINT16: CimType = CimType(18);
    pub const UINT32: CimType = CimType(19);
    pub const SINT64: CimType = CimType(20);
    pub const UINT64: CimType = CimType(21);
    pub const DATETIME: CimType = CimType(101);
    pub const REFERENCE: CimType = CimType(102);
    pub const CHAR16: CimType = CimType(103);

    /// Array modifier bit
    pub const FLAG_ARRAY: i32 = 0x2000;

    pub fn is_array(self) -> bool {
        self.0 & Self::FLAG_ARRAY != 0
    }

    /// Type without the array bit
    pub fn base(self) -> CimType {
        CimType(self.0 & !Self::FLAG_ARRAY)
    }

    /// Whether string values carry CIM datetime text
    pub fn is_datetime(self) -> bool {
        self.base() == Self::DATETIME
    }
}

/// A native dynamic value
#[derive(Clone, Debug, PartialEq)]
pub enum Variant {
    Empty,
    Null,
    I1(i8),
    UI1(u8),
    I2(i16),
    UI2(u16),
    I4(i32),
    UI4(u32),
    I8(i64),
    UI8(u64),
    Int(i32),
    UInt(u32),
    R4(f32),
    R8(f64),
    Bool(bool),
    /// OLE Automation date: days since 1899-12-30
    Date(f64),
    BStr(String),
    Array(SafeArray),
    /// Value of a type the bridge does not carry (decimal, currency,
    /// dispatch, nested variant, ...); only its tag is kept
    Other(VarType),
}

impl Variant {
    /// VARTYPE tag of this value
    pub fn var_type(&self) -> VarType {
        match self {
            Variant::Empty => VarType::EMPTY,
            Variant::Null => VarType::NULL,
            Variant::I1(_) => VarType::I1,
            Variant::UI1(_) => VarType::UI1,
            Variant::I2(_) => VarType::I2,
            Variant::UI2(_) => VarType::UI2,
            Variant::I4(_) => VarType::I4,
            Variant::UI4(_) => VarType::UI4,
            Variant::I8(_) => VarType::I8,
            Variant::UI8(_) => VarType::UI8,
            Variant::Int(_) => VarType::INT,
            Variant::UInt(_) => VarType::UINT,
            Variant::R4(_) => VarType::R4,
            Variant::R8(_) => VarType::R8,
            Variant::Bool(_) => VarType::BOOL,
            Variant::Date(_) => VarType::DATE,
            Variant::BStr(_) => VarType::BSTR,
            Variant::Array(array) => VarType::array_of(array.element_type()),
            Variant::Other(vt) => *vt,
        }
    }
}

/// Element storage of a SAFEARRAY
#[derive(Clone, Debug, PartialEq)]
pub enum SafeArrayData {
    /// Fixed-size elements, little-endian
    Raw(Bytes),
    /// BSTR elements
    Strings(Vec<String>),
}

/// One-dimensional SAFEARRAY
#[derive(Clone, Debug, PartialEq)]
pub struct SafeArray {
    element: VarType,
    lower_bound: i32,
    upper_bound: i32,
    data: SafeArrayData,
}

impl SafeArray {
    /// Create an array from its descriptor parts
    pub fn new(element: VarType, lower_bound: i32, upper_bound: i32, data: SafeArrayData) -> Self {
        Self {
            element,
            lower_bound,
            upper_bound,
            data,
        }
    }

    /// VT_UI1 array
    pub fn from_bytes(values: &[u8]) -> Self {
        Self::zero_based(VarType::UI1, values.len(), SafeArrayData::Raw(Bytes::copy_from_slice(values)))
    }

    /// VT_BOOL array (VARIANT_BOOL storage)
    pub fn from_bools(values: &[bool]) -> Self {
        let mut buf = BytesMut::with_capacity(values.len() * 2);
        for &value in values {
            buf.put_i16_le(if value { -1 } else { 0 });
        }
        Self::zero_based(VarType::BOOL, values.len(), SafeArrayData::Raw(buf.freeze()))
    }

    /// VT_I2 array
    pub fn from_i16s(values: &[i16]) -> Self {
        let mut buf = BytesMut::with_capacity(values.len() * 2);
        for &value in values {
            buf.put_i16_le(value);
        }
        Self::zero_based(VarType::I2, values.len(), SafeArrayData::Raw(buf.freeze()))
    }

    /// VT_I4 array
    pub fn from_i32s(values: &[i32]) -> Self {
        let mut buf = BytesMut::with_capacity(values.len() * 4);
        for &value in values {
            buf.put_i32_le(value);
        }
        Self::zero_based(VarType::I4, values.len(), SafeArrayData::Raw(buf.freeze()))
    }

    /// VT_R4 array
    pub fn from_f32s(values: &[f32]) -> Self {
        let mut buf = BytesMut::with_capacity(values.len() * 4);
        for &value in values {
            buf.put_f32_le(value);
        }
        Self::zero_based(VarType::R4, values.len(), SafeArrayData::Raw(buf.freeze()))
    }

    /// VT_R8 array
    pub fn from_f64s(values: &[f64]) -> Self {
        let mut buf = BytesMut::with_capacity(values.len() * 8);
        for &value in values {
            buf.put_f64_le(value);
        }
        Self::zero_based(VarType::R8, values.len(), SafeArrayData::Raw(buf.freeze()))
    }

    /// VT_BSTR array
    pub fn from_strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let strings: Vec<String> = values.into_iter().map(Into::into).collect();
        let len = strings.len();
        Self::zero_based(VarType::BSTR, len, SafeArrayData::Strings(strings))
    }

    fn zero_based(element: VarType, len: usize, data: SafeArrayData) -> Self {
        let upper_bound = i32::try_from(len).map(|n| n - 1).unwrap_or(i32::MAX);
        Self::new(element, 0, upper_bound, data)
    }

    pub fn element_type(&self) -> VarType {
        self.element
    }

    /// (lower, upper) bounds, inclusive
    pub fn bounds(&self) -> (i32, i32) {
        (self.lower_bound, self.upper_bound)
    }

    /// Element count implied by the bounds; zero when `upper < lower`
    pub fn len(&self) -> usize {
        if self.upper_bound < self.lower_bound {
            0
        } else {
            (i64::from(self.upper_bound) - i64::from(self.lower_bound) + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data(&self) -> &SafeArrayData {
        &self.data
    }
}
