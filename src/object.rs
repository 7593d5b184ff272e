//! Typed object model.
//!
//! A typed class is a struct that exposes an ordered list of [`PropertyDescriptor`]s and can
//! read and write each property as [`Data`]. The [`yaml_object!`](crate::yaml_object!) macro
//! generates all of this for a struct declaration; hand-written implementations of
//! [`YamlObject`] work too.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::metadata::MetadataStore;
use crate::naming::derive_key;
use crate::value::{Primitive, Timestamp, Value};

/// Property values as the mapper moves them around.
#[derive(Debug)]
pub enum Data {
    Null,
    Primitive(Primitive),
    List(Vec<Data>),
    /// An untyped mapping.
    Map(IndexMap<String, Data>),
    /// A typed class instance.
    Object(Box<dyn YamlObject>),
}

impl Clone for Data {
    fn clone(&self) -> Self {
        match self {
            Data::Null => Data::Null,
            Data::Primitive(p) => Data::Primitive(p.clone()),
            Data::List(items) => Data::List(items.clone()),
            Data::Map(map) => Data::Map(map.clone()),
            Data::Object(obj) => Data::Object(obj.clone_object()),
        }
    }
}

impl Default for Data {
    fn default() -> Self {
        Data::Null
    }
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Data::Null, Data::Null) => true,
            (Data::Primitive(a), Data::Primitive(b)) => a == b,
            (Data::List(a), Data::List(b)) => a == b,
            (Data::Map(a), Data::Map(b)) => a == b,
            (Data::Object(a), Data::Object(b)) => a.eq_object(b.as_ref()),
            _ => false,
        }
    }
}

impl Data {
    pub fn string<S: Into<String>>(s: S) -> Self {
        Data::Primitive(Primitive::String(s.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Data::Null)
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Data::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Plain conversion of a parsed value: scalars keep their inferred type, mappings become
    /// [`Data::Map`] (the last of exactly repeated keys wins).
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Data::Null,
            Value::Scalar { inferred, .. } => Data::Primitive(inferred.clone()),
            Value::Sequence(items) => Data::List(items.iter().map(Data::from_value).collect()),
            Value::Mapping(entries) => Data::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Data::from_value(v)))
                    .collect(),
            ),
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Data::Null => "null",
            Data::Primitive(p) => p.kind_name(),
            Data::List(_) => "list",
            Data::Map(_) => "map",
            Data::Object(o) => o.type_name(),
        }
    }
}

impl From<Primitive> for Data {
    fn from(value: Primitive) -> Self {
        Data::Primitive(value)
    }
}

/// Declared type of a property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyType {
    /// Accepts anything; values are stored as they come.
    Any,
    Bool,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    BigInt,
    Decimal,
    Float,
    Timestamp,
    String,
    /// Untyped mapping.
    Map,
    /// Typed class, by registered name.
    Object(&'static str),
    List(Box<PropertyType>),
}

impl PropertyType {
    /// Element type of a list, or the type itself.
    pub fn element(&self) -> &PropertyType {
        match self {
            PropertyType::List(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Any => f.write_str("any"),
            PropertyType::Bool => f.write_str("bool"),
            PropertyType::Int => f.write_str("int"),
            PropertyType::Long => f.write_str("long"),
            PropertyType::BigInt => f.write_str("big integer"),
            PropertyType::Decimal => f.write_str("decimal"),
            PropertyType::Float => f.write_str("float"),
            PropertyType::Timestamp => f.write_str("timestamp"),
            PropertyType::String => f.write_str("string"),
            PropertyType::Map => f.write_str("map"),
            PropertyType::Object(name) => f.write_str(name),
            PropertyType::List(inner) => write!(f, "list of {inner}"),
        }
    }
}

/// One property of a typed class.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDescriptor {
    /// Name of the property in the host struct.
    pub host_name: &'static str,
    /// Explicit document key. Bypasses key derivation and keeps its case.
    pub key: Option<&'static str>,
    pub property_type: PropertyType,
    /// Name of a registered converter.
    pub converter: Option<&'static str>,
}

impl PropertyDescriptor {
    /// The document key this property reads from and writes to.
    pub fn yaml_key(&self) -> String {
        match self.key {
            Some(key) => key.to_string(),
            None => derive_key(self.host_name),
        }
    }
}

/// Object-safe view of a typed class instance.
pub trait YamlObject: Any + fmt::Debug {
    fn type_name(&self) -> &'static str;

    /// Properties in declaration order.
    fn properties(&self) -> &'static [PropertyDescriptor];

    /// Read a property by host name.
    fn get(&self, property: &str) -> Option<Data>;

    /// Write a property by host name. The value comes back if the property does not exist or
    /// cannot hold it.
    fn set(&mut self, property: &str, value: Data) -> Result<(), Data>;

    /// Metadata of this instance, keyed by host property name.
    fn metadata(&self) -> &MetadataStore;

    fn metadata_mut(&mut self) -> &mut MetadataStore;

    fn clone_object(&self) -> Box<dyn YamlObject>;

    fn eq_object(&self, other: &dyn YamlObject) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A concrete typed class.
pub trait TypedClass: YamlObject + Default + Sized {
    const TYPE_NAME: &'static str;

    fn descriptors() -> &'static [PropertyDescriptor];
}

/// A Rust type that can be a property of a typed class.
pub trait Property: Sized {
    fn property_type() -> PropertyType;

    fn to_data(&self) -> Data;

    /// Convert from mapper data, handing the data back if it does not fit.
    fn from_data(data: Data) -> Result<Self, Data>;

    /// Register every typed class reachable through this type.
    fn register_types(_registry: &mut TypeRegistry) {}
}

/// Move a typed instance out of [`Data::Object`].
pub fn downcast_data<T: YamlObject>(data: Data) -> Result<T, Data> {
    match data {
        Data::Object(obj) if obj.as_any().is::<T>() => obj
            .into_any()
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| Data::Null),
        other => Err(other),
    }
}

fn integral_decimal(d: &Decimal) -> Option<Decimal> {
    d.fract().is_zero().then_some(*d)
}

fn as_i64(p: &Primitive) -> Option<i64> {
    match p {
        Primitive::Int(v) => Some(*v as i64),
        Primitive::Long(v) => Some(*v),
        Primitive::BigInt(v) => v.to_i64(),
        Primitive::Decimal(d) => integral_decimal(d).and_then(|d| d.to_i64()),
        _ => None,
    }
}

impl Property for bool {
    fn property_type() -> PropertyType {
        PropertyType::Bool
    }
    fn to_data(&self) -> Data {
        Data::Primitive(Primitive::Bool(*self))
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        match data {
            Data::Primitive(Primitive::Bool(b)) => Ok(b),
            other => Err(other),
        }
    }
}

impl Property for i32 {
    fn property_type() -> PropertyType {
        PropertyType::Int
    }
    fn to_data(&self) -> Data {
        Data::Primitive(Primitive::Int(*self))
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        match data.as_primitive().and_then(as_i64).and_then(|v| i32::try_from(v).ok()) {
            Some(v) => Ok(v),
            None => Err(data),
        }
    }
}

impl Property for i64 {
    fn property_type() -> PropertyType {
        PropertyType::Long
    }
    fn to_data(&self) -> Data {
        Data::Primitive(Primitive::from_bigint(BigInt::from(*self)))
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        match data.as_primitive().and_then(as_i64) {
            Some(v) => Ok(v),
            None => Err(data),
        }
    }
}

impl Property for BigInt {
    fn property_type() -> PropertyType {
        PropertyType::BigInt
    }
    fn to_data(&self) -> Data {
        Data::Primitive(Primitive::from_bigint(self.clone()))
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        let converted = match data.as_primitive() {
            Some(Primitive::BigInt(v)) => Some(v.clone()),
            Some(p) => as_i64(p).map(BigInt::from),
            None => None,
        };
        converted.ok_or(data)
    }
}

impl Property for Decimal {
    fn property_type() -> PropertyType {
        PropertyType::Decimal
    }
    fn to_data(&self) -> Data {
        Data::Primitive(Primitive::Decimal(*self))
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        let converted = match data.as_primitive() {
            Some(Primitive::Decimal(d)) => Some(*d),
            Some(Primitive::Int(v)) => Some(Decimal::from(*v)),
            Some(Primitive::Long(v)) => Some(Decimal::from(*v)),
            Some(Primitive::BigInt(v)) => v.to_i128().and_then(Decimal::from_i128),
            Some(Primitive::Float(f)) => Decimal::from_f64(*f),
            _ => None,
        };
        converted.ok_or(data)
    }
}

impl Property for f64 {
    fn property_type() -> PropertyType {
        PropertyType::Float
    }
    fn to_data(&self) -> Data {
        Data::Primitive(Primitive::Float(*self))
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        let converted = match data.as_primitive() {
            Some(Primitive::Float(f)) => Some(*f),
            Some(Primitive::Decimal(d)) => d.to_f64(),
            Some(Primitive::Int(v)) => Some(*v as f64),
            Some(Primitive::Long(v)) => Some(*v as f64),
            Some(Primitive::BigInt(v)) => v.to_f64(),
            _ => None,
        };
        converted.ok_or(data)
    }
}

impl Property for String {
    fn property_type() -> PropertyType {
        PropertyType::String
    }
    fn to_data(&self) -> Data {
        Data::string(self.clone())
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        match data {
            Data::Primitive(Primitive::String(s)) => Ok(s),
            Data::Primitive(p) => Ok(p.to_string()),
            other => Err(other),
        }
    }
}

impl Property for Timestamp {
    fn property_type() -> PropertyType {
        PropertyType::Timestamp
    }
    fn to_data(&self) -> Data {
        Data::Primitive(Primitive::Timestamp(self.clone()))
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        match data {
            Data::Primitive(Primitive::Timestamp(t)) => Ok(t),
            other => Err(other),
        }
    }
}

impl Property for NaiveDate {
    fn property_type() -> PropertyType {
        PropertyType::Timestamp
    }
    fn to_data(&self) -> Data {
        Timestamp::Date(*self).to_data()
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        match data {
            Data::Primitive(Primitive::Timestamp(Timestamp::Date(d))) => Ok(d),
            other => Err(other),
        }
    }
}

impl Property for NaiveDateTime {
    fn property_type() -> PropertyType {
        PropertyType::Timestamp
    }
    fn to_data(&self) -> Data {
        Timestamp::Local(*self).to_data()
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        match data {
            Data::Primitive(Primitive::Timestamp(Timestamp::Local(dt))) => Ok(dt),
            Data::Primitive(Primitive::Timestamp(Timestamp::Date(d))) => {
                d.and_hms_opt(0, 0, 0).ok_or(Data::Null)
            }
            other => Err(other),
        }
    }
}

impl Property for DateTime<FixedOffset> {
    fn property_type() -> PropertyType {
        PropertyType::Timestamp
    }
    fn to_data(&self) -> Data {
        Timestamp::Offset(*self).to_data()
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        match data {
            Data::Primitive(Primitive::Timestamp(Timestamp::Offset(dt))) => Ok(dt),
            other => Err(other),
        }
    }
}

impl Property for Data {
    fn property_type() -> PropertyType {
        PropertyType::Any
    }
    fn to_data(&self) -> Data {
        self.clone()
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        Ok(data)
    }
}

impl Property for IndexMap<String, Data> {
    fn property_type() -> PropertyType {
        PropertyType::Map
    }
    fn to_data(&self) -> Data {
        Data::Map(self.clone())
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        match data {
            Data::Map(map) => Ok(map),
            other => Err(other),
        }
    }
}

impl<T: Property> Property for Option<T> {
    fn property_type() -> PropertyType {
        T::property_type()
    }
    fn to_data(&self) -> Data {
        match self {
            Some(v) => v.to_data(),
            None => Data::Null,
        }
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        match data {
            Data::Null => Ok(None),
            other => T::from_data(other).map(Some),
        }
    }
    fn register_types(registry: &mut TypeRegistry) {
        T::register_types(registry);
    }
}

impl<T: Property> Property for Box<T> {
    fn property_type() -> PropertyType {
        T::property_type()
    }
    fn to_data(&self) -> Data {
        self.as_ref().to_data()
    }
    fn from_data(data: Data) -> Result<Self, Data> {
        T::from_data(data).map(Box::new)
    }
    fn register_types(registry: &mut TypeRegistry) {
        T::register_types(registry);
    }
}

impl<T: Property> Property for Vec<T> {
    fn property_type() -> PropertyType {
        PropertyType::List(Box::new(T::property_type()))
    }
    fn to_data(&self) -> Data {
        Data::List(self.iter().map(Property::to_data).collect())
    }
    /// Elements that do not fit `T` are dropped.
    fn from_data(data: Data) -> Result<Self, Data> {
        match data {
            Data::List(items) => Ok(items
                .into_iter()
                .filter_map(|item| match T::from_data(item) {
                    Ok(v) => Some(v),
                    Err(rejected) => {
                        log::debug!(
                            "list element of kind {} does not fit {}; dropped",
                            rejected.kind_name(),
                            T::property_type()
                        );
                        None
                    }
                })
                .collect()),
            other => Err(other),
        }
    }
    fn register_types(registry: &mut TypeRegistry) {
        T::register_types(registry);
    }
}

type Factory = fn() -> Box<dyn YamlObject>;

fn make<T: TypedClass>() -> Box<dyn YamlObject> {
    Box::new(T::default())
}

/// Typed classes the mapper can instantiate, keyed by [`TypedClass::TYPE_NAME`].
#[derive(Clone, Default)]
pub struct TypeRegistry {
    factories: HashMap<&'static str, Factory>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`. Returns false if a class of that name was already registered.
    pub fn register<T: TypedClass>(&mut self) -> bool {
        if self.factories.contains_key(T::TYPE_NAME) {
            return false;
        }
        self.factories.insert(T::TYPE_NAME, make::<T>);
        true
    }

    /// Register `T` and every typed class reachable from its properties.
    pub fn register_all<T: TypedClass + Property>(&mut self) {
        T::register_types(self);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// A fresh default instance of the named class.
    pub fn create(&self, type_name: &str) -> Option<Box<dyn YamlObject>> {
        self.factories.get(type_name).map(|factory| factory())
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&&str> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_widening() {
        assert_eq!(i64::from_data(Data::Primitive(Primitive::Int(7))), Ok(7));
        assert_eq!(
            f64::from_data(Data::Primitive(Primitive::Decimal(Decimal::new(15, 1)))),
            Ok(1.5)
        );
        assert_eq!(
            i32::from_data(Data::Primitive(Primitive::Long(i64::MAX))),
            Err(Data::Primitive(Primitive::Long(i64::MAX)))
        );
    }

    #[test]
    fn lists_drop_misfits() {
        let data = Data::List(vec![
            Data::Primitive(Primitive::Int(1)),
            Data::string("two"),
            Data::Primitive(Primitive::Int(3)),
        ]);
        assert_eq!(Vec::<i32>::from_data(data), Ok(vec![1, 3]));
    }

    #[test]
    fn options_map_null() {
        assert_eq!(Option::<bool>::from_data(Data::Null), Ok(None));
        assert_eq!(
            Option::<bool>::property_type(),
            PropertyType::Bool
        );
    }
}
