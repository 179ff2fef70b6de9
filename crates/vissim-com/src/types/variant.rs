//! Dynamically typed attribute values
//!
//! The server reports attribute values as OLE automation variants. Callers
//! coerce them explicitly with `TryFrom`; a coercion that does not fit fails
//! with [`ComError::AttributeTypeMismatch`] instead of truncating.

use std::fmt;

use super::error::{ComError, Result};

/// OLE automation VARTYPE codes understood by the interop layer
pub mod vartype {
    /// Nothing assigned
    pub const EMPTY: u16 = 0;
    /// SQL-style null
    pub const NULL: u16 = 1;
    /// 16-bit signed integer
    pub const I2: u16 = 2;
    /// 32-bit signed integer
    pub const I4: u16 = 3;
    /// 32-bit float
    pub const R4: u16 = 4;
    /// 64-bit float
    pub const R8: u16 = 5;
    /// Automation string
    pub const BSTR: u16 = 8;
    /// IDispatch pointer
    pub const DISPATCH: u16 = 9;
    /// `VARIANT_BOOL`
    pub const BOOL: u16 = 11;
    /// IUnknown pointer
    pub const UNKNOWN: u16 = 13;
    /// 8-bit unsigned integer
    pub const UI1: u16 = 17;
    /// 16-bit unsigned integer
    pub const UI2: u16 = 18;
    /// 64-bit signed integer
    pub const I8: u16 = 20;
    /// Machine integer
    pub const INT: u16 = 22;
}

/// A scalar attribute value as reported by the server
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Variant {
    /// No value
    #[default]
    Empty,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    I4(i32),
    /// 64-bit integer
    I8(i64),
    /// Double precision float
    R8(f64),
    /// String
    Str(String),
}

impl Variant {
    /// Name of the contained type, used in mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Empty => "empty",
            Variant::Null => "null",
            Variant::Bool(_) => "bool",
            Variant::I4(_) => "i32",
            Variant::I8(_) => "i64",
            Variant::R8(_) => "f64",
            Variant::Str(_) => "string",
        }
    }

    /// VARTYPE code of the contained value
    pub fn vartype(&self) -> u16 {
        match self {
            Variant::Empty => vartype::EMPTY,
            Variant::Null => vartype::NULL,
            Variant::Bool(_) => vartype::BOOL,
            Variant::I4(_) => vartype::I4,
            Variant::I8(_) => vartype::I8,
            Variant::R8(_) => vartype::R8,
            Variant::Str(_) => vartype::BSTR,
        }
    }

    /// True for `Empty` and `Null`
    pub fn is_nothing(&self) -> bool {
        matches!(self, Variant::Empty | Variant::Null)
    }

    /// Borrow the string payload
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Variant::Str(s) => Ok(s),
            other => Err(mismatch("string", other)),
        }
    }
}

fn mismatch(expected: &'static str, found: &Variant) -> ComError {
    ComError::AttributeTypeMismatch {
        expected,
        found: found.type_name(),
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Empty | Variant::Null => Ok(()),
            Variant::Bool(v) => write!(f, "{}", v),
            Variant::I4(v) => write!(f, "{}", v),
            Variant::I8(v) => write!(f, "{}", v),
            Variant::R8(v) => write!(f, "{}", v),
            Variant::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Bool(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::I4(value)
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::I8(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::R8(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::Str(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::Str(value)
    }
}

impl TryFrom<&Variant> for i32 {
    type Error = ComError;

    fn try_from(value: &Variant) -> Result<Self> {
        match value {
            Variant::I4(v) => Ok(*v),
            Variant::I8(v) => i32::try_from(*v).map_err(|_| mismatch("i32", value)),
            other => Err(mismatch("i32", other)),
        }
    }
}

impl TryFrom<&Variant> for i64 {
    type Error = ComError;

    fn try_from(value: &Variant) -> Result<Self> {
        match value {
            Variant::I4(v) => Ok(i64::from(*v)),
            Variant::I8(v) => Ok(*v),
            other => Err(mismatch("i64", other)),
        }
    }
}

impl TryFrom<&Variant> for f64 {
    type Error = ComError;

    fn try_from(value: &Variant) -> Result<Self> {
        match value {
            Variant::I4(v) => Ok(f64::from(*v)),
            Variant::R8(v) => Ok(*v),
            other => Err(mismatch("f64", other)),
        }
    }
}

impl TryFrom<&Variant> for bool {
    type Error = ComError;

    fn try_from(value: &Variant) -> Result<Self> {
        match value {
            Variant::Bool(v) => Ok(*v),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl TryFrom<&Variant> for String {
    type Error = ComError;

    fn try_from(value: &Variant) -> Result<Self> {
        value.as_str().map(str::to_string)
    }
}

macro_rules! owned_try_from {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<Variant> for $ty {
                type Error = ComError;

                fn try_from(value: Variant) -> Result<Self> {
                    <$ty>::try_from(&value)
                }
            }
        )*
    };
}

owned_try_from!(i32, i64, f64, bool);

impl TryFrom<Variant> for String {
    type Error = ComError;

    fn try_from(value: Variant) -> Result<Self> {
        match value {
            Variant::Str(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}
