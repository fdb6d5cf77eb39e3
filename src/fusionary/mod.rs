//! Fusionary: declarative mapping between records and fixed binary layouts.
//!
//! A record is declared once with [`record!`](crate::record) and can then be
//! read from or written to a byte slice. There are no tags on the wire: the
//! layout is entirely defined by the field types, in declaration order.
//!
//! | Field type | Wire layout |
//! |---|---|
//! | `u8..u64`, `i8..i64` | raw, little-endian |
//! | [`Endian<T, O>`](crate::endian::Endian) | raw, in order `O` |
//! | `bool` | one byte, 0 or 1 |
//! | enums declared with [`field_enum!`](crate::field_enum) | the discriminant as the declared integer type |
//! | `String`, `Vec<T>`, `HashMap<K, V>` | little-endian u16 count, then elements |
//! | `[T; N]` | `N` elements |
//! | [`FieldFlag<T>`] | a `T`, visible to later fields of the record |
//! | [`OptionalField<T, I, B>`] | a `T` if bit `B` of field `I` is set, else nothing |
//! | [`VarsizeField<C, I, W, O>`] | the candidate of `C` chosen by `W` bits of field `I` at offset `O` |
//! | [`Marker<E, V>`] | the constant `V` as an `E` |
//! | [`Nothing`] | nothing |
//! | [`Rest`] | all remaining bytes; last field only |
//!
//! Reading past the end of the input is [`Error::BufferUnderflow`] and writing
//! past the end of the destination is [`Error::BufferOverflow`].

mod conditional;
mod cursor;
mod field;
mod macros;

use std::fmt;

pub use conditional::{Candidates, FieldFlag, Marker, Nothing, OptionalField, Rest, VarsizeField};
pub use cursor::{ReadCursor, WriteCursor, MAX_COUNT};
pub use field::{Field, FlagContext, FlagValue};
pub use macros::{ends_trailing, trailing_is_last};

use crate::error::{Error, Result};

/// A struct declared with [`record!`](crate::record).
pub trait Record: Field {
    /// Field names in declaration order.
    const FIELD_NAMES: &'static [&'static str];

    /// Writes `name:value` pairs separated by `, `.
    fn print_fields(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Reads a `T` from the front of `data` and returns it with the unread rest.
pub fn read<T: Field>(data: &[u8]) -> Result<(T, &[u8])> {
    let mut cursor = ReadCursor::new(data);
    let value = T::read_field(&mut cursor, &FlagContext::new())?;
    Ok((value, cursor.into_remainder()))
}

/// Writes `value` to the front of `buffer` and returns the unwritten rest.
pub fn write<'a, T: Field>(buffer: &'a mut [u8], value: &T) -> Result<&'a mut [u8]> {
    let mut cursor = WriteCursor::new(buffer);
    value.write_field(&mut cursor, &FlagContext::new())?;
    Ok(cursor.into_remainder())
}

/// Writes `value` into a buffer of exactly its encoded size.
pub fn to_vec<T: Field>(value: &T) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; value.encoded_len()];
    let unused = write(&mut buffer, value)?.len();
    if unused != 0 {
        return Err(Error::Encode(format!(
            "encoded length overestimated by {} bytes",
            unused
        )));
    }
    Ok(buffer)
}

/// Displays a record as `name:value, name:value`.
pub struct Pretty<'a, T>(&'a T);

impl<T: Record> fmt::Display for Pretty<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.print_fields(f)
    }
}

/// Returns a displayable view of `record`.
///
/// Nested records print inside braces; variant fields print as
/// `varsize_field[INDEX]`.
pub fn pretty_print<T: Record>(record: &T) -> Pretty<'_, T> {
    Pretty(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::{BigU16, BigU32, BigU64};

    crate::candidates! {
        #[derive(Debug, Clone, PartialEq)]
        enum TwoBits {
            NoValue(Nothing),
            Value1(u16),
            Value2(u32),
            Value3(u64),
        }
    }

    type PacketSize = VarsizeField<TwoBits, 0, 2, 2>;
    type PacketSize2 = VarsizeField<TwoBits, 2, 2, 2>;

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Header {
            flags: FieldFlag<u8>,
            packet_size: PacketSize,
        }
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct BigHeader {
            flags: FieldFlag<u8>,
            packet_size: PacketSize,
            flags2: FieldFlag<u8>,
            packet_size2: PacketSize2,
        }
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Packet {
            header1: Header,
            header23: BigHeader,
            header4: Header,
            body: Rest,
        }
    }

    const PACKET: [u8; 23] = [
        0x04, 0xab, 0xcd, //
        0x00, //
        0x08, 0xab, 0xcd, 0xef, 0x12, //
        0x0c, 0xab, 0xcd, 0xef, 0x12, 0x34, 0x56, 0x78, 0x9a, //
        b'H', b'e', b'l', b'l', b'o',
    ];

    #[test]
    fn test_varsize_packet() {
        let (packet, rest) = read::<Packet>(&PACKET).unwrap();
        assert!(rest.is_empty());
        assert_eq!(packet.header1.packet_size.value.value::<u64>(), 0xcdab);
        assert_eq!(packet.header23.packet_size.value.value::<u64>(), 0);
        assert_eq!(packet.header23.packet_size2.value.value::<u64>(), 0x12efcdab);
        assert_eq!(
            packet.header4.packet_size.value.value::<u64>(),
            0x9a78563412efcdab
        );
        assert_eq!(packet.body.as_bytes(), b"Hello");

        assert_eq!(to_vec(&packet).unwrap(), PACKET);
    }

    #[test]
    fn test_varsize_out_of_range_selector() {
        crate::candidates! {
            #[derive(Debug, Clone, PartialEq)]
            enum Three {
                Empty(Nothing),
                Short(u16),
                Long(u32),
            }
        }

        crate::record! {
            #[derive(Debug, Default, Clone, PartialEq)]
            struct Narrow {
                flags: FieldFlag<u8>,
                size: VarsizeField<Three, 0, 2, 0>,
            }
        }

        let err = read::<Narrow>(&[0x03, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, Error::InvalidSelector { selector: 3, candidates: 3 }));

        let narrow = Narrow {
            flags: FieldFlag::new(3),
            size: VarsizeField::new(Three::Empty(Nothing)),
        };
        assert!(matches!(
            to_vec(&narrow),
            Err(Error::InvalidSelector { selector: 3, .. })
        ));
    }

    #[test]
    fn test_varsize_selector_mismatch_on_write() {
        let header = Header {
            flags: FieldFlag::new(0x04),
            packet_size: VarsizeField::new(TwoBits::Value2(7)),
        };
        assert!(matches!(
            to_vec(&header),
            Err(Error::FlagMismatch { index: 0, .. })
        ));
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct StreamFrame {
            flags: FieldFlag<u8>,
            stream_id: BigU32,
            parent_stream_id: OptionalField<BigU32, 0, 0>,
            usid: OptionalField<[u8; 4], 0, 1>,
            offset: OptionalField<BigU64, 0, 2>,
            data_length: BigU16,
        }
    }

    #[test]
    fn test_optional_fields() {
        let mut frame = StreamFrame {
            flags: FieldFlag::new(0b101),
            stream_id: BigU32::new(0x01020304),
            parent_stream_id: OptionalField::some(BigU32::new(9)),
            usid: OptionalField::none(),
            offset: OptionalField::some(BigU64::new(0x10)),
            data_length: BigU16::new(2),
        };
        let bytes = to_vec(&frame).unwrap();
        assert_eq!(bytes.len(), 1 + 4 + 4 + 8 + 2);
        assert_eq!(&bytes[..5], &[0b101, 1, 2, 3, 4]);
        let (decoded, _) = read::<StreamFrame>(&bytes).unwrap();
        assert_eq!(decoded, frame);

        frame.flags.set_bit(0, false);
        frame.parent_stream_id = OptionalField::none();
        let bytes = to_vec(&frame).unwrap();
        assert_eq!(bytes.len(), 1 + 4 + 8 + 2);
        let (decoded, _) = read::<StreamFrame>(&bytes).unwrap();
        assert!(decoded.parent_stream_id.is_none());
    }

    crate::field_enum! {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        enum MsgType: u8 {
            #[default]
            Type1 = 0,
            Type2 = 1,
            Type3 = 2,
        }
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct TypedFrame {
            flags: FieldFlag<u8>,
            stream_id: BigU32,
            msg_type: MsgType,
            parent_stream_id: OptionalField<BigU32, 0, 0>,
        }
    }

    #[test]
    fn test_enum_field_in_record() {
        let frame = TypedFrame {
            flags: FieldFlag::new(1),
            stream_id: BigU32::new(7),
            msg_type: MsgType::Type3,
            parent_stream_id: OptionalField::some(BigU32::new(3)),
        };
        let bytes = to_vec(&frame).unwrap();
        assert_eq!(bytes, [1, 0, 0, 0, 7, 2, 0, 0, 0, 3]);
        let (decoded, rest) = read::<TypedFrame>(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, frame);
        assert_eq!(
            pretty_print(&decoded).to_string(),
            "flags:1, stream_id:7, msg_type:Type3, parent_stream_id:3"
        );
        assert_eq!(TypedFrame::default().msg_type, MsgType::Type1);

        let mut unknown = bytes.clone();
        unknown[5] = 3;
        assert!(matches!(
            read::<TypedFrame>(&unknown),
            Err(Error::InvalidDiscriminant { name: "MsgType", value: 3 })
        ));
    }

    #[test]
    fn test_optional_field_needs_earlier_flag() {
        crate::record! {
            #[derive(Debug, Default)]
            struct Forward {
                value: OptionalField<u8, 1, 0>,
                flags: FieldFlag<u8>,
            }
        }

        assert!(matches!(read::<Forward>(&[1, 1]), Err(Error::MissingFlag(1))));
    }

    #[test]
    fn test_nested_record_has_own_context() {
        crate::record! {
            #[derive(Debug, Default)]
            struct Inner {
                value: OptionalField<u8, 0, 0>,
            }
        }

        crate::record! {
            #[derive(Debug, Default)]
            struct Outer {
                flags: FieldFlag<u8>,
                inner: Inner,
            }
        }

        // Field 0 of Inner is the optional itself, not Outer's flag field.
        assert!(matches!(read::<Outer>(&[1, 5]), Err(Error::MissingFlag(0))));
    }

    #[test]
    fn test_marker_in_record() {
        crate::record! {
            #[derive(Debug, Default)]
            struct Versioned {
                magic: Marker<BigU32, 0x4d45_5441>,
                version: u8,
            }
        }

        let (record, _) = read::<Versioned>(b"META\x02").unwrap();
        assert_eq!(record.version, 2);
        assert!(matches!(
            read::<Versioned>(b"META"),
            Err(Error::BufferUnderflow { .. })
        ));
        assert!(matches!(
            read::<Versioned>(b"ATEM\x02"),
            Err(Error::MarkerMismatch { .. })
        ));
    }

    #[test]
    fn test_write_bounds() {
        let header = Header {
            flags: FieldFlag::new(0x0c),
            packet_size: VarsizeField::new(TwoBits::Value3(1)),
        };
        let mut small = [0u8; 5];
        assert!(matches!(
            write(&mut small, &header),
            Err(Error::BufferOverflow { needed: 8, available: 4 })
        ));

        let mut large = [0u8; 12];
        let rest = write(&mut large, &header).unwrap();
        assert_eq!(rest.len(), 3);
    }

    #[test]
    fn test_pretty_print() {
        let (packet, _) = read::<Packet>(&PACKET).unwrap();
        assert_eq!(
            pretty_print(&packet.header1).to_string(),
            "flags:4, packet_size:varsize_field[0]"
        );
        assert_eq!(
            pretty_print(&packet).to_string(),
            "header1:{flags:4, packet_size:varsize_field[0]}, \
             header23:{flags:0, packet_size:varsize_field[0], flags2:8, packet_size2:varsize_field[2]}, \
             header4:{flags:12, packet_size:varsize_field[0]}, \
             body:Hello"
        );
        assert_eq!(Packet::FIELD_NAMES, &["header1", "header23", "header4", "body"]);
    }

    #[test]
    fn test_record_trailing_flag() {
        assert!(Packet::TRAILING);
        assert!(!Header::TRAILING);
    }

    #[test]
    fn test_trailing_through_wrappers() {
        crate::candidates! {
            #[derive(Debug, Clone, PartialEq)]
            enum Tail {
                Empty(Nothing),
                Body(Rest),
            }
        }

        crate::record! {
            #[derive(Debug, Default, Clone, PartialEq)]
            struct MaybeBody {
                flags: FieldFlag<u8>,
                body: OptionalField<Rest, 0, 0>,
            }
        }

        assert!(OptionalField::<Rest, 0, 0>::TRAILING);
        assert!(!OptionalField::<u8, 0, 0>::TRAILING);
        assert!(<Tail as Candidates>::TRAILING);
        assert!(!<TwoBits as Candidates>::TRAILING);
        assert!(<VarsizeField<Tail, 0, 1, 0> as Field>::TRAILING);
        assert!(!<PacketSize as Field>::TRAILING);
        assert!(MaybeBody::TRAILING);
        assert!(trailing_is_last(&[
            <u8 as Field>::TRAILING,
            <OptionalField<u8, 0, 0> as Field>::TRAILING,
            <VarsizeField<Tail, 0, 1, 0> as Field>::TRAILING,
        ]));
        assert!(!trailing_is_last(&[
            <OptionalField<Rest, 0, 0> as Field>::TRAILING,
            <u8 as Field>::TRAILING,
        ]));

        let (record, _) = read::<MaybeBody>(b"\x01tail").unwrap();
        assert_eq!(record.body.as_ref().map(Rest::as_bytes), Some(&b"tail"[..]));
    }
}
