//! Value codec: converts a [`Value`] of a declared [`ValueKind`] to and from
//! the portable string stored in a saved field record.
//!
//! Encoded forms:
//!
//! | Kind   | Form                                            |
//! |--------|-------------------------------------------------|
//! | Enum   | variant name                                    |
//! | Bool   | `true` / `false`                                |
//! | Int    | decimal                                         |
//! | Float  | shortest round-trip decimal, `NaN`, `inf`       |
//! | String | verbatim                                        |
//! | Array  | `{"items":[<encoded element>, ...]}`            |
//! | List   | `{"items":[<encoded element>, ...]}`            |
//! | Object | structural JSON                                 |
//!
//! Collections are wrapped in a one-field carrier so the JSON layer always
//! sees a single root object. Elements are encoded recursively with the same
//! dispatch, so an encoded string can be decoded from the kind alone.

use serde::{Deserialize, Serialize};

use crate::error::{KeepsakeError, Result};
use crate::value::{mismatch, Persist, Value, ValueKind};

/// One-field carrier for arrays and lists.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Carrier {
    items: Vec<String>,
}

/// Encode `value` as declared by `kind`.
///
/// # Errors
/// Returns [`KeepsakeError::TypeMismatch`] if the value's shape differs from
/// the kind, [`KeepsakeError::UnknownVariant`] for an undeclared enum name,
/// [`KeepsakeError::LengthMismatch`] for a wrongly sized array.
pub fn encode(value: &Value, kind: &ValueKind) -> Result<String> {
    match (kind, value) {
        (ValueKind::Enum { name, variants }, Value::Enum(variant)) => {
            if variants.contains(&variant.as_str()) {
                Ok(variant.clone())
            } else {
                Err(KeepsakeError::UnknownVariant {
                    enum_name: (*name).to_string(),
                    variant: variant.clone(),
                })
            }
        }
        (ValueKind::Bool, Value::Bool(b)) => Ok(b.to_string()),
        (ValueKind::Int, Value::Int(i)) => Ok(i.to_string()),
        (ValueKind::Float, Value::Float(f)) => Ok(f.to_string()),
        (ValueKind::String, Value::String(s)) => Ok(s.clone()),
        (ValueKind::Array { element, len }, Value::Array(items)) => {
            if items.len() != *len {
                return Err(KeepsakeError::LengthMismatch {
                    expected: *len,
                    found: items.len(),
                });
            }
            wrap(items, element)
        }
        (ValueKind::List { element }, Value::List(items)) => wrap(items, element),
        (ValueKind::Object { .. }, Value::Object(json)) => Ok(serde_json::to_string(json)?),
        (kind, value) => Err(mismatch(kind, value)),
    }
}

/// Decode `encoded` as declared by `kind`.
///
/// # Errors
/// Returns [`KeepsakeError::Parse`] for unparsable scalars,
/// [`KeepsakeError::UnknownVariant`] for an enum name the kind does not
/// declare, [`KeepsakeError::LengthMismatch`] for a wrongly sized array and
/// [`KeepsakeError::Serialization`] for malformed carriers or objects.
pub fn decode(encoded: &str, kind: &ValueKind) -> Result<Value> {
    match kind {
        ValueKind::Enum { name, variants } => variants
            .iter()
            .find(|v| **v == encoded)
            .map(|v| Value::Enum((*v).to_string()))
            .ok_or_else(|| KeepsakeError::UnknownVariant {
                enum_name: (*name).to_string(),
                variant: encoded.to_string(),
            }),
        ValueKind::Bool => encoded.parse().map(Value::Bool).map_err(|_| parse_error(kind, encoded)),
        ValueKind::Int => encoded.parse().map(Value::Int).map_err(|_| parse_error(kind, encoded)),
        ValueKind::Float => encoded.parse().map(Value::Float).map_err(|_| parse_error(kind, encoded)),
        ValueKind::String => Ok(Value::String(encoded.to_string())),
        ValueKind::Array { element, len } => {
            let items = unwrap(encoded, element)?;
            if items.len() != *len {
                return Err(KeepsakeError::LengthMismatch {
                    expected: *len,
                    found: items.len(),
                });
            }
            Ok(Value::Array(items))
        }
        ValueKind::List { element } => unwrap(encoded, element).map(Value::List),
        ValueKind::Object { .. } => Ok(Value::Object(serde_json::from_str(encoded)?)),
    }
}

/// Encode a typed value using its declared kind.
///
/// # Errors
/// See [`encode`] and [`Persist::to_value`].
pub fn encode_typed<T: Persist>(value: &T) -> Result<String> {
    encode(&value.to_value()?, &T::value_kind())
}

/// Decode a typed value using its declared kind.
///
/// # Errors
/// See [`decode`] and [`Persist::from_value`].
pub fn decode_typed<T: Persist>(encoded: &str) -> Result<T> {
    T::from_value(decode(encoded, &T::value_kind())?)
}

fn wrap(items: &[Value], element: &ValueKind) -> Result<String> {
    let carrier = Carrier {
        items: items
            .iter()
            .map(|item| encode(item, element))
            .collect::<Result<_>>()?,
    };
    Ok(serde_json::to_string(&carrier)?)
}

fn unwrap(encoded: &str, element: &ValueKind) -> Result<Vec<Value>> {
    let carrier: Carrier = serde_json::from_str(encoded)?;
    let mut items = Vec::with_capacity(carrier.items.len());
    for item in &carrier.items {
        items.push(decode(item, element)?);
    }
    Ok(items)
}

fn parse_error(kind: &ValueKind, input: &str) -> KeepsakeError {
    KeepsakeError::Parse {
        kind: kind.type_name(),
        input: input.to_string(),
    }
}
