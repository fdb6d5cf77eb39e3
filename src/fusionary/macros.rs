//! Declaration macros for records and variant candidate sets.

/// Returns true if no trailing field is followed by another field.
pub const fn trailing_is_last(trailing: &[bool]) -> bool {
    let mut i = 0;
    while i + 1 < trailing.len() {
        if trailing[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Returns true if the last field is trailing.
pub const fn ends_trailing(trailing: &[bool]) -> bool {
    !trailing.is_empty() && trailing[trailing.len() - 1]
}

/// Declares a struct whose fields map directly onto a binary layout.
///
/// Fields are read and written in declaration order. Each record keeps its
/// own flag context, so optional and variant fields reference flag fields of
/// the same record by zero-based field index.
///
/// A field that may consume the rest of the input, including an optional or
/// variant field wrapping [`Rest`](crate::fusionary::Rest), must come last:
///
/// ```compile_fail
/// use arsenal::fusionary::{FieldFlag, OptionalField, Rest};
///
/// arsenal::record! {
///     struct Broken {
///         flags: FieldFlag<u8>,
///         tail: OptionalField<Rest, 0, 0>,
///         after: u8,
///     }
/// }
/// ```
///
/// ```rust
/// use arsenal::fusionary::{self, FieldFlag, OptionalField};
/// use arsenal::endian::BigU32;
///
/// arsenal::record! {
///     #[derive(Debug, Default, Clone, PartialEq)]
///     pub struct Frame {
///         pub flags: FieldFlag<u8>,
///         pub stream_id: BigU32,
///         pub parent: OptionalField<BigU32, 0, 0>,
///     }
/// }
///
/// let frame = Frame {
///     flags: FieldFlag::new(1),
///     stream_id: BigU32::new(7),
///     parent: OptionalField::some(BigU32::new(3)),
/// };
/// let bytes = fusionary::to_vec(&frame).unwrap();
/// assert_eq!(bytes, [1, 0, 0, 0, 7, 0, 0, 0, 3]);
/// let (decoded, rest) = fusionary::read::<Frame>(&bytes).unwrap();
/// assert_eq!(decoded, frame);
/// assert!(rest.is_empty());
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        const _: () = assert!(
            $crate::fusionary::trailing_is_last(&[
                $(<$ty as $crate::fusionary::Field>::TRAILING),*
            ]),
            "a trailing field must be the last field of its record"
        );

        impl $crate::fusionary::Field for $name {
            const TRAILING: bool = $crate::fusionary::ends_trailing(&[
                $(<$ty as $crate::fusionary::Field>::TRAILING),*
            ]);

            #[allow(unused_mut, unused_variables)]
            fn read_field(
                cursor: &mut $crate::fusionary::ReadCursor<'_>,
                _parent: &$crate::fusionary::FlagContext,
            ) -> $crate::Result<Self> {
                let mut context = $crate::fusionary::FlagContext::new();
                $(
                    let $field = <$ty as $crate::fusionary::Field>::read_field(cursor, &context)?;
                    context.push($crate::fusionary::Field::flag_bits(&$field));
                )*
                Ok(Self { $($field),* })
            }

            #[allow(unused_mut, unused_variables)]
            fn write_field(
                &self,
                cursor: &mut $crate::fusionary::WriteCursor<'_>,
                _parent: &$crate::fusionary::FlagContext,
            ) -> $crate::Result<()> {
                let mut context = $crate::fusionary::FlagContext::new();
                $(
                    $crate::fusionary::Field::write_field(&self.$field, cursor, &context)?;
                    context.push($crate::fusionary::Field::flag_bits(&self.$field));
                )*
                Ok(())
            }

            fn encoded_len(&self) -> usize {
                0 $(+ $crate::fusionary::Field::encoded_len(&self.$field))*
            }

            fn print_field(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str("{")?;
                $crate::fusionary::Record::print_fields(self, f)?;
                f.write_str("}")
            }
        }

        impl $crate::fusionary::Record for $name {
            const FIELD_NAMES: &'static [&'static str] = &[$(stringify!($field)),*];

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn print_fields(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                let mut first = true;
                $(
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    f.write_str(concat!(stringify!($field), ":"))?;
                    $crate::fusionary::Field::print_field(&self.$field, f)?;
                )*
                Ok(())
            }
        }
    };
}

/// Declares the candidate set of a variant field.
///
/// Each variant wraps one field type; the variant's position is the selector
/// value that chooses it. The first variant is the default.
///
/// ```rust
/// use arsenal::fusionary::{Candidates, Nothing};
///
/// arsenal::candidates! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub enum Size {
///         Empty(Nothing),
///         Short(u16),
///         Long(u32),
///     }
/// }
///
/// assert_eq!(Size::COUNT, 3);
/// assert_eq!(Size::Long(9).selector(), 2);
/// assert_eq!(Size::Short(9).value::<u64>(), 9);
/// assert_eq!(Size::Empty(Nothing).value::<u64>(), 0);
/// ```
#[macro_export]
macro_rules! candidates {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $first:ident ( $first_ty:ty )
            $(, $variant:ident ( $ty:ty ))* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $first($first_ty),
            $($variant($ty),)*
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                $name::$first(::std::default::Default::default())
            }
        }

        impl $name {
            /// The active candidate converted to `V`.
            pub fn value<V>(&self) -> V
            where
                V: ::std::convert::From<$first_ty> $(+ ::std::convert::From<$ty>)*,
            {
                match self {
                    $name::$first(v) => V::from(::std::clone::Clone::clone(v)),
                    $($name::$variant(v) => V::from(::std::clone::Clone::clone(v)),)*
                }
            }
        }

        impl $crate::fusionary::Candidates for $name {
            const COUNT: usize = [stringify!($first) $(, stringify!($variant))*].len();

            const TRAILING: bool = <$first_ty as $crate::fusionary::Field>::TRAILING
                $(|| <$ty as $crate::fusionary::Field>::TRAILING)*;

            #[allow(unused_assignments, unused_mut, irrefutable_let_patterns)]
            fn selector(&self) -> u64 {
                if let $name::$first(_) = self {
                    return 0;
                }
                let mut index = 1u64;
                $(
                    if let $name::$variant(_) = self {
                        return index;
                    }
                    index += 1;
                )*
                index
            }

            #[allow(unused_assignments, unused_mut)]
            fn read_candidate(
                selector: u64,
                cursor: &mut $crate::fusionary::ReadCursor<'_>,
                flags: &$crate::fusionary::FlagContext,
            ) -> $crate::Result<Self> {
                if selector == 0 {
                    return <$first_ty as $crate::fusionary::Field>::read_field(cursor, flags)
                        .map($name::$first);
                }
                let mut index = 1u64;
                $(
                    if selector == index {
                        return <$ty as $crate::fusionary::Field>::read_field(cursor, flags)
                            .map($name::$variant);
                    }
                    index += 1;
                )*
                Err($crate::Error::InvalidSelector {
                    selector,
                    candidates: index as usize,
                })
            }

            fn write_candidate(
                &self,
                cursor: &mut $crate::fusionary::WriteCursor<'_>,
                flags: &$crate::fusionary::FlagContext,
            ) -> $crate::Result<()> {
                match self {
                    $name::$first(v) => $crate::fusionary::Field::write_field(v, cursor, flags),
                    $($name::$variant(v) => $crate::fusionary::Field::write_field(v, cursor, flags),)*
                }
            }

            fn candidate_len(&self) -> usize {
                match self {
                    $name::$first(v) => $crate::fusionary::Field::encoded_len(v),
                    $($name::$variant(v) => $crate::fusionary::Field::encoded_len(v),)*
                }
            }
        }
    };
}

/// Declares a C-like enum stored on the wire as its discriminant.
///
/// The discriminant is read and written as the given integer field type. A
/// value that names no variant is
/// [`Error::InvalidDiscriminant`](crate::Error::InvalidDiscriminant).
///
/// ```rust
/// use arsenal::endian::BigU16;
/// use arsenal::fusionary;
///
/// arsenal::field_enum! {
///     #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
///     pub enum MsgType: BigU16 {
///         #[default]
///         Hello = 1,
///         Data = 2,
///         Close = 0x100,
///     }
/// }
///
/// assert_eq!(fusionary::to_vec(&MsgType::Close).unwrap(), [0x01, 0x00]);
/// assert_eq!(fusionary::read::<MsgType>(&[0, 2]).unwrap().0, MsgType::Data);
/// assert!(fusionary::read::<MsgType>(&[0, 3]).is_err());
/// ```
#[macro_export]
macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ty {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $value:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )+
        }

        impl $name {
            /// Discriminant as stored on the wire, zero-extended.
            pub fn discriminant(&self) -> u64 {
                match self {
                    $($name::$variant => Self::wire_bits($value as i128),)+
                }
            }

            /// The variant stored as `bits`.
            pub fn from_discriminant(bits: u64) -> ::std::option::Option<Self> {
                $(
                    if bits == Self::wire_bits($value as i128) {
                        return ::std::option::Option::Some($name::$variant);
                    }
                )+
                ::std::option::Option::None
            }

            // Truncates to the width of the wire type.
            fn wire_bits(value: i128) -> u64 {
                $crate::fusionary::FlagValue::to_flag(
                    &<$repr as $crate::fusionary::FlagValue>::from_flag(value as u64),
                )
            }
        }

        impl $crate::fusionary::Field for $name {
            fn read_field(
                cursor: &mut $crate::fusionary::ReadCursor<'_>,
                flags: &$crate::fusionary::FlagContext,
            ) -> $crate::Result<Self> {
                let raw = <$repr as $crate::fusionary::Field>::read_field(cursor, flags)?;
                let bits = $crate::fusionary::FlagValue::to_flag(&raw);
                Self::from_discriminant(bits).ok_or($crate::Error::InvalidDiscriminant {
                    name: stringify!($name),
                    value: bits,
                })
            }

            fn write_field(
                &self,
                cursor: &mut $crate::fusionary::WriteCursor<'_>,
                flags: &$crate::fusionary::FlagContext,
            ) -> $crate::Result<()> {
                let raw = <$repr as $crate::fusionary::FlagValue>::from_flag(self.discriminant());
                $crate::fusionary::Field::write_field(&raw, cursor, flags)
            }

            fn encoded_len(&self) -> usize {
                let raw = <$repr as $crate::fusionary::FlagValue>::from_flag(self.discriminant());
                $crate::fusionary::Field::encoded_len(&raw)
            }

            fn print_field(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $($name::$variant => f.write_str(stringify!($variant)),)+
                }
            }
        }
    };
}
