//! Dynamically typed flurry values.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;

use crate::error::{Error, Result};

/// A self-describing value of any wire type.
///
/// Encoding keeps the width of the variant only as far as the minimal tag
/// allows. Decoding always produces [`Value::I64`] or [`Value::U64`] for
/// integers, so compare decoded integers through [`Value::as_i64`] or
/// [`Value::as_u64`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Blob(Bytes),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Ext(i8, Bytes),
}

impl Value {
    /// Builds a value from a type-erased reference.
    ///
    /// Candidates are tried in a fixed order: signed integers, unsigned
    /// integers, strings, maps, arrays, blobs, floats, bool.
    pub fn from_any<T: Any>(value: &T) -> Result<Value> {
        let value = value as &dyn Any;
        macro_rules! try_candidates {
            ($($type:ty => $wrap:expr),* $(,)?) => {
                $(
                    if let Some(v) = value.downcast_ref::<$type>() {
                        return Ok($wrap(v.clone()));
                    }
                )*
            };
        }

        try_candidates! {
            i64 => Value::I64,
            i32 => Value::I32,
            i16 => Value::I16,
            i8 => Value::I8,
            u64 => Value::U64,
            u32 => Value::U32,
            u16 => Value::U16,
            u8 => Value::U8,
            String => Value::String,
            &'static str => |s: &str| Value::String(s.to_owned()),
            BTreeMap<String, Value> => Value::Map,
            Vec<Value> => Value::Array,
            Bytes => Value::Blob,
            Vec<u8> => |v: Vec<u8>| Value::Blob(Bytes::from(v)),
            f64 => Value::F64,
            f32 => Value::F32,
            bool => Value::Bool,
            Value => |v: Value| v,
        }

        Err(Error::UnsupportedType(std::any::type_name::<T>().to_owned()))
    }

    /// Name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Blob(_) => "blob",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Ext(..) => "ext",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Any integer variant that fits an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v as i64),
            Value::I16(v) => Some(v as i64),
            Value::I32(v) => Some(v as i64),
            Value::I64(v) => Some(v),
            Value::U8(v) => Some(v as i64),
            Value::U16(v) => Some(v as i64),
            Value::U32(v) => Some(v as i64),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Any integer variant that fits a u64.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v as u64),
            Value::U16(v) => Some(v as u64),
            Value::U32(v) => Some(v as u64),
            Value::U64(v) => Some(v),
            Value::I8(v) => u64::try_from(v).ok(),
            Value::I16(v) => u64::try_from(v).ok(),
            Value::I32(v) => u64::try_from(v).ok(),
            Value::I64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v as f64),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Blob(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::Blob(v) => write!(f, "<{} bytes>", v.len()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, item)?;
                }
                write!(f, "}}")
            }
            Value::Ext(ext_type, data) => write!(f, "ext({}, <{} bytes>)", ext_type, data.len()),
        }
    }
}

macro_rules! impl_from {
    ($($type:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    Bytes => Blob,
    Vec<Value> => Array,
    BTreeMap<String, Value> => Map,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(Bytes::copy_from_slice(v))
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_any_candidate_order() {
        assert_eq!(Value::from_any(&5i32).unwrap(), Value::I32(5));
        assert_eq!(Value::from_any(&5u16).unwrap(), Value::U16(5));
        assert_eq!(
            Value::from_any(&String::from("hi")).unwrap(),
            Value::String("hi".into())
        );
        assert_eq!(Value::from_any(&"hi").unwrap(), Value::String("hi".into()));
        assert_eq!(
            Value::from_any(&vec![1u8, 2]).unwrap(),
            Value::Blob(Bytes::from_static(&[1, 2]))
        );
        assert_eq!(Value::from_any(&true).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_from_any_unsupported() {
        let err = Value::from_any(&'c').unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(ref name) if name == "char"));
    }

    #[test]
    fn test_integer_accessors_cross_width() {
        assert_eq!(Value::I8(-3).as_i64(), Some(-3));
        assert_eq!(Value::I8(-3).as_u64(), None);
        assert_eq!(Value::U32(7).as_i64(), Some(7));
        assert_eq!(Value::U64(u64::MAX).as_i64(), None);
        assert_eq!(Value::String("7".into()).as_u64(), None);
    }

    #[test]
    fn test_display() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::Array(vec![1u8.into(), Value::Nil]));
        assert_eq!(Value::Map(map).to_string(), "{\"a\": [1, nil]}");
    }
}
