//! Generic value tree produced by the document parser.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::float_format::push_float_string;
use crate::metadata::MetadataStore;

/// A YAML timestamp, kept at the precision it was written with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Timestamp {
    /// `2024-01-15`
    Date(NaiveDate),
    /// `2024-01-15T10:30:00` (no offset)
    Local(NaiveDateTime),
    /// `2024-01-15T10:30:00+02:00`
    Offset(DateTime<FixedOffset>),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Timestamp::Local(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Timestamp::Offset(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

/// The type inferred (or demanded by a tag) for a scalar.
///
/// Integers are narrowed to the smallest of `Int`/`Long`/`BigInt` that holds them.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Int(i32),
    Long(i64),
    BigInt(BigInt),
    Decimal(Decimal),
    /// Only values a decimal cannot hold: `.inf`, `.nan`, huge exponents.
    Float(f64),
    Timestamp(Timestamp),
    String(String),
}

impl Primitive {
    /// Narrow an arbitrary-precision integer to the smallest representation that fits.
    pub fn from_bigint(value: BigInt) -> Self {
        if let Some(v) = value.to_i32() {
            Primitive::Int(v)
        } else if let Some(v) = value.to_i64() {
            Primitive::Long(v)
        } else {
            Primitive::BigInt(value)
        }
    }

    /// Short human name of the runtime kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Primitive::Bool(_) => "bool",
            Primitive::Int(_) => "int",
            Primitive::Long(_) => "long",
            Primitive::BigInt(_) => "big integer",
            Primitive::Decimal(_) => "decimal",
            Primitive::Float(_) => "float",
            Primitive::Timestamp(_) => "timestamp",
            Primitive::String(_) => "string",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Primitive::Int(_) | Primitive::Long(_) | Primitive::BigInt(_)
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Primitive::Decimal(_) | Primitive::Float(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Primitive::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Bool(b) => write!(f, "{b}"),
            Primitive::Int(v) => write!(f, "{v}"),
            Primitive::Long(v) => write!(f, "{v}"),
            Primitive::BigInt(v) => write!(f, "{v}"),
            Primitive::Decimal(v) => write!(f, "{v}"),
            Primitive::Float(v) => {
                let mut s = String::new();
                push_float_string(&mut s, *v);
                f.write_str(&s)
            }
            Primitive::Timestamp(t) => write!(f, "{t}"),
            Primitive::String(s) => f.write_str(s),
        }
    }
}

impl Serialize for Primitive {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Primitive::Bool(b) => s.serialize_bool(*b),
            Primitive::Int(v) => s.serialize_i32(*v),
            Primitive::Long(v) => s.serialize_i64(*v),
            Primitive::BigInt(v) => match v.to_i128() {
                Some(n) => s.serialize_i128(n),
                None => s.serialize_str(&v.to_string()),
            },
            Primitive::Decimal(v) => match v.to_f64() {
                Some(n) => s.serialize_f64(n),
                None => s.serialize_str(&v.to_string()),
            },
            Primitive::Float(v) => s.serialize_f64(*v),
            Primitive::Timestamp(t) => s.serialize_str(&t.to_string()),
            Primitive::String(v) => s.serialize_str(v),
        }
    }
}

/// A parsed YAML node.
///
/// Mapping keys are literal strings and keep document order. Keys that differ only by
/// case are distinct entries here; collision checks happen in the parser and mapper.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Scalar { raw: String, inferred: Primitive },
    Mapping(Vec<(String, Value)>),
    Sequence(Vec<Value>),
}

impl Value {
    /// Build a scalar whose raw text is the canonical rendering of `value`.
    pub fn scalar(value: Primitive) -> Self {
        Value::Scalar {
            raw: value.to_string(),
            inferred: value,
        }
    }

    pub fn string<S: Into<String>>(s: S) -> Self {
        let s = s.into();
        Value::Scalar {
            raw: s.clone(),
            inferred: Primitive::String(s),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Look up a mapping entry by exact key. The last entry wins if a key repeats.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(entries) => entries.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Sequence(items) => items.get(index),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Value::Scalar { inferred, .. } => Some(inferred),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_primitive().and_then(Primitive::as_str)
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            Value::Scalar { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => s.serialize_unit(),
            Value::Scalar { inferred, .. } => inferred.serialize(s),
            Value::Mapping(entries) => {
                let mut map = s.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Sequence(items) => {
                let mut seq = s.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// One parsed document: its value tree and the metadata tree that mirrors it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub value: Value,
    pub metadata: MetadataStore,
}

impl Document {
    pub fn new(value: Value, metadata: MetadataStore) -> Self {
        Self { value, metadata }
    }

    /// Re-emit this document with default options.
    pub fn to_yaml_string(&self) -> crate::Result<String> {
        crate::to_string(self)
    }
}
