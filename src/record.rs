//! Destination records
//!
//! Captured strings land in records through a schema descriptor rather than
//! reflection: a [`Record`] maps field names to typed setters, and each field
//! type decides through [`FieldValue`] how a string is coerced into it.
//!
//! Coercion rules:
//!
//! | Field type | Behaviour |
//! |------------|-----------|
//! | `String` | replaced |
//! | signed / unsigned integers | decimal parse, overflow reported separately |
//! | `f32`, `f64` | float parse, `f32` range checked |
//! | `Vec<T>` | one `T` parsed and appended |
//! | `Option<T>` | one `T` parsed and stored as `Some` |
//!
//! The [`record!`](crate::record!) macro writes the [`Record`] impl for a struct.

use crate::error::FieldError;
use std::collections::BTreeMap;
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

/// A type that captured values can be assigned into by field name.
///
/// `Default` supplies the fresh element allocated for each match when the
/// destination is a list.
pub trait Record: Default {
    /// The field names this record accepts. Every target of a pattern is checked against
    /// them before matching starts. Empty for records that accept any name.
    fn field_names() -> &'static [&'static str];

    /// Stores `value` into `field`. Unknown names are [`FieldError::UnknownField`].
    fn assign(&mut self, field: &str, value: String) -> Result<(), FieldError>;
}

/// A field type a captured string can be coerced into.
pub trait FieldValue {
    fn assign(&mut self, value: String) -> Result<(), FieldError>;
}

impl FieldValue for String {
    fn assign(&mut self, value: String) -> Result<(), FieldError> {
        *self = value;
        Ok(())
    }
}

fn parse_integer<T>(value: String) -> Result<T, FieldError>
where
    T: FromStr<Err = ParseIntError>,
{
    let kind = std::any::type_name::<T>();
    value.parse::<T>().map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            FieldError::Overflow { value, kind }
        }
        _ => FieldError::Parse { value, kind },
    })
}

macro_rules! integer_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn assign(&mut self, value: String) -> Result<(), FieldError> {
                    *self = parse_integer(value)?;
                    Ok(())
                }
            }
        )*
    };
}

integer_field!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

fn parse_float(value: String, kind: &'static str) -> Result<f64, FieldError> {
    match value.parse::<f64>() {
        Ok(n) => Ok(n),
        Err(_) => Err(FieldError::Parse { value, kind }),
    }
}

impl FieldValue for f64 {
    fn assign(&mut self, value: String) -> Result<(), FieldError> {
        *self = parse_float(value, "f64")?;
        Ok(())
    }
}

impl FieldValue for f32 {
    fn assign(&mut self, value: String) -> Result<(), FieldError> {
        let n = match value.parse::<f64>() {
            Ok(n) => n,
            Err(_) => return Err(FieldError::Parse { value, kind: "f32" }),
        };
        if n.is_finite() && n.abs() > f64::from(f32::MAX) {
            return Err(FieldError::Overflow { value, kind: "f32" });
        }
        *self = n as f32;
        Ok(())
    }
}

impl<T: FieldValue + Default> FieldValue for Vec<T> {
    fn assign(&mut self, value: String) -> Result<(), FieldError> {
        let mut item = T::default();
        item.assign(value)?;
        self.push(item);
        Ok(())
    }
}

impl<T: FieldValue + Default> FieldValue for Option<T> {
    fn assign(&mut self, value: String) -> Result<(), FieldError> {
        let mut item = T::default();
        item.assign(value)?;
        *self = Some(item);
        Ok(())
    }
}

/// Accepts any field name, overwriting on repeat.
impl Record for BTreeMap<String, String> {
    fn field_names() -> &'static [&'static str] {
        &[]
    }

    fn assign(&mut self, field: &str, value: String) -> Result<(), FieldError> {
        self.insert(field.to_string(), value);
        Ok(())
    }
}

/// Implements [`Record`] for a struct by listing its fields.
///
/// Pattern targets name fields exactly as listed. `as "Name"` binds a field
/// under a different name.
///
/// ```ignore
/// #[derive(Default)]
/// struct App { id: String, name: String, rating: Option<f64> }
///
/// grape::record!(App { id as "ID", name as "Name", rating as "Rating" });
/// ```
#[macro_export]
macro_rules! record {
    (@name $field:ident $name:literal) => {
        $name
    };
    (@name $field:ident) => {
        stringify!($field)
    };
    ($ty:ty { $($field:ident $(as $name:literal)?),+ $(,)? }) => {
        impl $crate::Record for $ty {
            fn field_names() -> &'static [&'static str] {
                &[$($crate::record!(@name $field $($name)?)),+]
            }

            fn assign(
                &mut self,
                field: &str,
                value: ::std::string::String,
            ) -> ::std::result::Result<(), $crate::FieldError> {
                $(
                    if field == $crate::record!(@name $field $($name)?) {
                        return $crate::FieldValue::assign(&mut self.$field, value);
                    }
                )+
                ::std::result::Result::Err($crate::FieldError::UnknownField(field.to_string()))
            }
        }
    };
}
