//! Typed traversal: [`Pack`] and [`Unpack`] for the supported Rust types.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use bytes::Bytes;

use crate::endian::{ByteOrder, Endian, Scalar};
use crate::error::{Error, Result};
use crate::flurry::reader::Reader;
use crate::flurry::value::Value;
use crate::flurry::writer::Writer;

/// Types that can be encoded as a flurry value.
pub trait Pack {
    fn pack(&self, writer: &mut Writer) -> Result<()>;
}

/// Types that can be decoded from a flurry value.
pub trait Unpack: Sized {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self>;
}

macro_rules! impl_int {
    ($($type:ty => $pack:ident, $unpack:ident);* $(;)?) => {
        $(
            impl Pack for $type {
                fn pack(&self, writer: &mut Writer) -> Result<()> {
                    writer.$pack(*self)
                }
            }

            impl Unpack for $type {
                fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
                    reader.$unpack()
                }
            }
        )*
    };
}

impl_int! {
    u8 => pack_u8, unpack_u8;
    u16 => pack_u16, unpack_u16;
    u32 => pack_u32, unpack_u32;
    u64 => pack_u64, unpack_u64;
    i8 => pack_i8, unpack_i8;
    i16 => pack_i16, unpack_i16;
    i32 => pack_i32, unpack_i32;
    i64 => pack_i64, unpack_i64;
    f32 => pack_f32, unpack_f32;
    f64 => pack_f64, unpack_f64;
    bool => pack_bool, unpack_bool;
}

impl Pack for usize {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        writer.pack_unsigned(*self as u64)
    }
}

impl Unpack for usize {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        reader.unpack_int()
    }
}

impl Pack for isize {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        writer.pack_signed(*self as i64)
    }
}

impl Unpack for isize {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        reader.unpack_int()
    }
}

impl Pack for () {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        writer.pack_nil()
    }
}

impl Unpack for () {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        reader.unpack_nil()
    }
}

impl Pack for str {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        writer.pack_str(self)
    }
}

impl Pack for String {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        writer.pack_str(self)
    }
}

impl Unpack for String {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        reader.unpack_string()
    }
}

impl Pack for Bytes {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        writer.pack_blob(self)
    }
}

impl Unpack for Bytes {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        reader.unpack_bytes()
    }
}

impl Pack for Value {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        writer.pack_value(self)
    }
}

impl Unpack for Value {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        reader.unpack_value()
    }
}

impl<T: Pack + ?Sized> Pack for &T {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        (**self).pack(writer)
    }
}

impl<T: Pack + ?Sized> Pack for Box<T> {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        (**self).pack(writer)
    }
}

impl<T: Unpack> Unpack for Box<T> {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        T::unpack(reader).map(Box::new)
    }
}

/// `None` is written as nil.
impl<T: Pack> Pack for Option<T> {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Some(value) => value.pack(writer),
            None => writer.pack_nil(),
        }
    }
}

impl<T: Unpack> Unpack for Option<T> {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        if reader.maybe_unpack_nil() {
            Ok(None)
        } else {
            T::unpack(reader).map(Some)
        }
    }
}

impl<T: Pack> Pack for [T] {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        writer.pack_array_header(self.len())?;
        for item in self {
            item.pack(writer)?;
        }
        Ok(())
    }
}

impl<T: Pack> Pack for Vec<T> {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        self.as_slice().pack(writer)
    }
}

impl<T: Unpack> Unpack for Vec<T> {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let len = reader.unpack_array_header()?;
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(T::unpack(reader)?);
        }
        Ok(items)
    }
}

impl<T: Pack, const N: usize> Pack for [T; N] {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        self.as_slice().pack(writer)
    }
}

impl<T: Unpack, const N: usize> Unpack for [T; N] {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let len = reader.unpack_array_header()?;
        if len != N {
            return Err(Error::ArrayLength {
                expected: N,
                found: len,
            });
        }
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::unpack(reader)?);
        }
        items.try_into().map_err(|items: Vec<T>| Error::ArrayLength {
            expected: N,
            found: items.len(),
        })
    }
}

fn pack_map<'a, K, V, I>(writer: &mut Writer, len: usize, entries: I) -> Result<()>
where
    K: Pack + 'a,
    V: Pack + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    writer.pack_map_header(len)?;
    for (key, value) in entries {
        key.pack(writer)?;
        value.pack(writer)?;
    }
    Ok(())
}

impl<K: Pack, V: Pack, S> Pack for HashMap<K, V, S> {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        pack_map(writer, self.len(), self.iter())
    }
}

impl<K, V, S> Unpack for HashMap<K, V, S>
where
    K: Unpack + Eq + Hash,
    V: Unpack,
    S: BuildHasher + Default,
{
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let len = reader.unpack_map_header()?;
        let mut map = HashMap::with_capacity_and_hasher(len, S::default());
        for _ in 0..len {
            let key = K::unpack(reader)?;
            let value = V::unpack(reader)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<K: Pack, V: Pack> Pack for BTreeMap<K, V> {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        pack_map(writer, self.len(), self.iter())
    }
}

impl<K: Unpack + Ord, V: Unpack> Unpack for BTreeMap<K, V> {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let len = reader.unpack_map_header()?;
        let mut map = BTreeMap::new();
        for _ in 0..len {
            let key = K::unpack(reader)?;
            let value = V::unpack(reader)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

/// Endian wrappers encode their host-native value; the wire order is always
/// big-endian.
impl<T: Scalar + Pack, O: ByteOrder> Pack for Endian<T, O> {
    fn pack(&self, writer: &mut Writer) -> Result<()> {
        self.get().pack(writer)
    }
}

impl<T: Scalar + Unpack, O: ByteOrder> Unpack for Endian<T, O> {
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        T::unpack(reader).map(Endian::new)
    }
}
