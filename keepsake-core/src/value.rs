//! Value kinds, runtime values, and the typed [`Persist`] conversion.
//!
//! [`ValueKind`] is the closed set of shapes the codec understands. Every
//! persisted Rust type reports one through [`Persist::value_kind`], and its
//! [`ValueKind::type_name`] is written next to each saved field so a record
//! can be checked against the live field before decoding.

use std::fmt;

use crate::error::{KeepsakeError, Result};

/// Declared shape of a persisted field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// `true` / `false`.
    Bool,
    /// Any signed or unsigned integer up to 64 bits.
    Int,
    /// `f32` or `f64`.
    Float,
    /// UTF-8 text, stored verbatim.
    String,
    /// A fieldless enum, stored by variant name.
    Enum {
        /// Enum type name.
        name: &'static str,
        /// Declared variant names.
        variants: &'static [&'static str],
    },
    /// Fixed-length array.
    Array {
        /// Element kind.
        element: Box<ValueKind>,
        /// Declared length.
        len: usize,
    },
    /// Growable list.
    List {
        /// Element kind.
        element: Box<ValueKind>,
    },
    /// Structured value object, encoded field-by-field through serde.
    Object {
        /// Object type name.
        name: &'static str,
    },
}

impl ValueKind {
    /// Type identity written into every saved field record.
    ///
    /// Nested kinds compose, e.g. `list<enum<Difficulty>>`.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::Bool => "bool".to_string(),
            Self::Int => "int".to_string(),
            Self::Float => "float".to_string(),
            Self::String => "string".to_string(),
            Self::Enum { name, .. } => format!("enum<{name}>"),
            Self::Array { element, .. } => format!("array<{}>", element.type_name()),
            Self::List { element } => format!("list<{}>", element.type_name()),
            Self::Object { name } => format!("object<{name}>"),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// A runtime field value in codec form.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Integer, widened so every `i64` and `u64` fits.
    Int(i128),
    /// Floating point, widened to 64 bits.
    Float(f64),
    /// Text.
    String(String),
    /// Enum variant name.
    Enum(String),
    /// Fixed-length array elements.
    Array(Vec<Value>),
    /// List elements.
    List(Vec<Value>),
    /// Structural JSON tree of a value object.
    Object(serde_json::Value),
}

impl Value {
    /// Short label of the value's shape, used in mismatch errors.
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Enum(_) => "enum",
            Self::Array(_) => "array",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }
}

#[doc(hidden)]
#[must_use]
pub fn mismatch(expected: &ValueKind, found: &Value) -> KeepsakeError {
    KeepsakeError::TypeMismatch {
        expected: expected.type_name(),
        found: found.shape().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Persist
// ---------------------------------------------------------------------------

/// Conversion between a typed Rust value and its codec [`Value`].
///
/// Implemented for `bool`, the integer and float primitives, `String`,
/// `Vec<T>` and `[T; N]`. Fieldless enums opt in with
/// [`persist_enum!`](crate::persist_enum) and serde value objects with
/// [`persist_object!`](crate::persist_object).
pub trait Persist: Sized {
    /// Declared kind of this type.
    fn value_kind() -> ValueKind;

    /// Convert into codec form.
    ///
    /// # Errors
    /// Returns an error when the value cannot be represented, e.g. an object
    /// serde refuses to serialize.
    fn to_value(&self) -> Result<Value>;

    /// Rebuild from codec form.
    ///
    /// # Errors
    /// Returns an error when the value's shape or range does not fit `Self`.
    fn from_value(value: Value) -> Result<Self>;
}

impl Persist for bool {
    fn value_kind() -> ValueKind {
        ValueKind::Bool
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(&Self::value_kind(), &other)),
        }
    }
}

macro_rules! persist_int {
    ($($t:ty),+ $(,)?) => {$(
        impl Persist for $t {
            fn value_kind() -> ValueKind {
                ValueKind::Int
            }

            fn to_value(&self) -> Result<Value> {
                i128::try_from(*self).map(Value::Int).map_err(|_| KeepsakeError::OutOfRange {
                    kind: stringify!($t),
                    value: self.to_string(),
                })
            }

            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Int(v) => <$t>::try_from(v).map_err(|_| KeepsakeError::OutOfRange {
                        kind: stringify!($t),
                        value: v.to_string(),
                    }),
                    other => Err(mismatch(&Self::value_kind(), &other)),
                }
            }
        }
    )+};
}

persist_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Persist for f64 {
    fn value_kind() -> ValueKind {
        ValueKind::Float
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Float(*self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(v),
            other => Err(mismatch(&Self::value_kind(), &other)),
        }
    }
}

impl Persist for f32 {
    fn value_kind() -> ValueKind {
        ValueKind::Float
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Float(f64::from(*self)))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(v) => {
                let narrowed = v as f32;
                if v.is_finite() && !narrowed.is_finite() {
                    return Err(KeepsakeError::OutOfRange {
                        kind: "f32",
                        value: v.to_string(),
                    });
                }
                Ok(narrowed)
            }
            other => Err(mismatch(&Self::value_kind(), &other)),
        }
    }
}

impl Persist for String {
    fn value_kind() -> ValueKind {
        ValueKind::String
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch(&Self::value_kind(), &other)),
        }
    }
}

impl<T: Persist> Persist for Vec<T> {
    fn value_kind() -> ValueKind {
        ValueKind::List {
            element: Box::new(T::value_kind()),
        }
    }

    fn to_value(&self) -> Result<Value> {
        self.iter()
            .map(Persist::to_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch(&Self::value_kind(), &other)),
        }
    }
}

impl<T: Persist, const N: usize> Persist for [T; N] {
    fn value_kind() -> ValueKind {
        ValueKind::Array {
            element: Box::new(T::value_kind()),
            len: N,
        }
    }

    fn to_value(&self) -> Result<Value> {
        self.iter()
            .map(Persist::to_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => {
                let decoded = items
                    .into_iter()
                    .map(T::from_value)
                    .collect::<Result<Vec<T>>>()?;
                decoded
                    .try_into()
                    .map_err(|rest: Vec<T>| KeepsakeError::LengthMismatch {
                        expected: N,
                        found: rest.len(),
                    })
            }
            other => Err(mismatch(&Self::value_kind(), &other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Opt-in macros
// ---------------------------------------------------------------------------

/// Implement [`Persist`] for a fieldless enum, stored by variant name.
///
/// ```
/// # use keepsake_core::persist_enum;
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Difficulty { Easy, Normal, Hard }
/// persist_enum!(Difficulty { Easy, Normal, Hard });
/// ```
#[macro_export]
macro_rules! persist_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::value::Persist for $ty {
            fn value_kind() -> $crate::value::ValueKind {
                $crate::value::ValueKind::Enum {
                    name: stringify!($ty),
                    variants: &[$(stringify!($variant)),+],
                }
            }

            fn to_value(&self) -> $crate::error::Result<$crate::value::Value> {
                let name = match self {
                    $(Self::$variant => stringify!($variant),)+
                };
                Ok($crate::value::Value::Enum(name.to_string()))
            }

            fn from_value(value: $crate::value::Value) -> $crate::error::Result<Self> {
                match value {
                    $crate::value::Value::Enum(name) => match name.as_str() {
                        $(stringify!($variant) => Ok(Self::$variant),)+
                        _ => Err($crate::error::KeepsakeError::UnknownVariant {
                            enum_name: stringify!($ty).to_string(),
                            variant: name,
                        }),
                    },
                    other => Err($crate::value::mismatch(
                        &<Self as $crate::value::Persist>::value_kind(),
                        &other,
                    )),
                }
            }
        }
    };
}

/// Implement [`Persist`] for a serde value object, encoded structurally.
///
/// ```
/// # use keepsake_core::persist_object;
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Position { x: f32, y: f32 }
/// persist_object!(Position);
/// ```
#[macro_export]
macro_rules! persist_object {
    ($ty:ident) => {
        impl $crate::value::Persist for $ty {
            fn value_kind() -> $crate::value::ValueKind {
                $crate::value::ValueKind::Object {
                    name: stringify!($ty),
                }
            }

            fn to_value(&self) -> $crate::error::Result<$crate::value::Value> {
                Ok($crate::value::Value::Object($crate::__serde_json::to_value(self)?))
            }

            fn from_value(value: $crate::value::Value) -> $crate::error::Result<Self> {
                match value {
                    $crate::value::Value::Object(json) => Ok($crate::__serde_json::from_value(json)?),
                    other => Err($crate::value::mismatch(
                        &<Self as $crate::value::Persist>::value_kind(),
                        &other,
                    )),
                }
            }
        }
    };
}
