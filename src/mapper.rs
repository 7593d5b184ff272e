//! Typed Mapper: parsed values ⇄ typed class instances.
//!
//! Deserializing walks a mapping against the target's [`PropertyDescriptor`]s:
//!
//! 1. keys are grouped case-insensitively; a group with more than one spelling is only valid
//!    when every spelling is the explicit key of some property,
//! 2. per-property metadata is copied onto the instance before any value is assigned, so
//!    converters already see the tags,
//! 3. each property present in the mapping is converted, built recursively, or coerced.
//!    Coercion failures fall back to the raw value and never fail the whole mapping.
//!
//! Metadata layout on an instance: the fields of a property live under its host name in the
//! instance's store. For properties holding typed instances only the fields stay there, the
//! nested instance carries its own properties. Everything else (untyped maps, lists of
//! primitives) keeps its full subtree.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::converter::{Converter, ConverterRegistry};
use crate::emitter::emit;
use crate::error::{Error, Location, Result};
use crate::metadata::{MetaKey, MetadataStore, ScalarStyle, format_path};
use crate::object::{
    Data, Property, PropertyDescriptor, PropertyType, TypeRegistry, TypedClass, YamlObject,
};
use crate::options::{EmitOptions, ParseOptions, RenderOptions};
use crate::parse_scalars::{parse_bigint, parse_bool_strict, parse_float, parse_scalar, parse_timestamp};
use crate::render::render;
use crate::value::{Document, Primitive, Value};

/// Maps documents to typed classes and back.
///
/// ```rust
/// use saphyr_meta::Mapper;
///
/// saphyr_meta::yaml_object! {
///     #[derive(Clone, Debug, Default, PartialEq)]
///     pub struct Server {
///         pub host: String,
///         pub max_connections: i32,
///     }
/// }
///
/// let mapper = Mapper::new();
/// let server: Server = mapper
///     .from_str("host: example.org # primary\nmax-connections: 16\n")
///     .unwrap();
/// assert_eq!(server.max_connections, 16);
/// assert_eq!(server.metadata.property_comment("host"), Some("primary"));
///
/// let text = mapper.to_string(&server).unwrap();
/// assert_eq!(text, "# primary\nhost: example.org\nmax-connections: 16\n");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Mapper {
    registry: TypeRegistry,
    converters: ConverterRegistry,
    parse_options: ParseOptions,
    emit_options: EmitOptions,
    render_options: RenderOptions,
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Emit options. `max_depth` also bounds nesting when building instances.
    pub fn with_emit_options(mut self, options: EmitOptions) -> Self {
        self.emit_options = options;
        self
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Register `T` and every typed class reachable from its properties, so they can be
    /// built by name.
    pub fn register_type<T: TypedClass + Property>(&mut self) -> &mut Self {
        self.registry.register_all::<T>();
        self
    }

    pub fn register_converter<C: Converter + 'static>(
        &mut self,
        name: impl Into<String>,
        converter: C,
    ) -> &mut Self {
        self.converters.register(name, converter);
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Parse a single-document text and map it onto `T`.
    pub fn from_str<T: TypedClass + Property>(&self, input: &str) -> Result<T> {
        let doc = crate::parse_single(input, &self.parse_options, true)?;
        self.from_document(&doc)
    }

    pub fn from_document<T: TypedClass + Property>(&self, doc: &Document) -> Result<T> {
        self.from_value(&doc.value, &doc.metadata)
    }

    /// Build a `T` from a value tree and the metadata that mirrors it.
    ///
    /// A null root gives `T::default()`.
    pub fn from_value<T: TypedClass + Property>(
        &self,
        value: &Value,
        metadata: &MetadataStore,
    ) -> Result<T> {
        let mut registry = self.registry.clone();
        T::register_types(&mut registry);
        let mut obj = T::default();
        self.builder(&registry).fill_root(&mut obj, value, metadata)?;
        Ok(obj)
    }

    /// Build an instance of a registered class by name.
    pub fn from_value_named(
        &self,
        type_name: &str,
        value: &Value,
        metadata: &MetadataStore,
    ) -> Result<Box<dyn YamlObject>> {
        let mut obj = self
            .registry
            .create(type_name)
            .ok_or_else(|| Error::Type {
                type_name: type_name.to_string(),
            })?;
        self.builder(&self.registry)
            .fill_root(obj.as_mut(), value, metadata)?;
        Ok(obj)
    }

    /// Value tree and metadata for `obj`, properties in declaration order.
    pub fn to_value(&self, obj: &dyn YamlObject) -> Result<(Value, MetadataStore)> {
        let mut root = MetadataStore::new();
        root.copy_fields_from(obj.metadata());
        let value = self.object_to_value(obj, &mut root, 1)?;
        Ok((value, root))
    }

    pub fn to_document(&self, obj: &dyn YamlObject) -> Result<Document> {
        let (value, metadata) = self.to_value(obj)?;
        Ok(Document::new(value, metadata))
    }

    /// Emit and render `obj` with this mapper's options.
    pub fn to_string(&self, obj: &dyn YamlObject) -> Result<String> {
        let (value, metadata) = self.to_value(obj)?;
        let events = emit(&value, &metadata, &self.emit_options)?;
        render(&events, &self.render_options)
    }

    fn builder<'a>(&'a self, registry: &'a TypeRegistry) -> Builder<'a> {
        Builder {
            registry,
            converters: &self.converters,
            max_depth: self.emit_options.max_depth,
        }
    }

    fn object_to_value(
        &self,
        obj: &dyn YamlObject,
        node: &mut MetadataStore,
        depth: usize,
    ) -> Result<Value> {
        if depth > self.emit_options.max_depth {
            log::debug!(
                "{} at depth {depth} replaced by an empty mapping",
                obj.type_name()
            );
            return Ok(Value::Mapping(Vec::new()));
        }
        let mut entries = Vec::with_capacity(obj.properties().len());
        for descriptor in obj.properties() {
            let key = descriptor.yaml_key();
            let data = obj.get(descriptor.host_name).unwrap_or(Data::Null);
            let src = obj.metadata().nested(descriptor.host_name);
            let mut child = fields_of(src);
            let value = match descriptor.converter {
                Some(name) if !data.is_null() => self.convert_out(name, &data, &mut child)?,
                _ => self.data_to_value(&data, src, &mut child, depth + 1)?,
            };
            entries.push((key.clone(), value));
            node.insert_nested(key, child);
        }
        Ok(Value::Mapping(entries))
    }

    /// `node` already holds the fields of `src`; children are filled in here.
    fn data_to_value(
        &self,
        data: &Data,
        src: Option<&MetadataStore>,
        node: &mut MetadataStore,
        depth: usize,
    ) -> Result<Value> {
        match data {
            Data::Null => Ok(Value::Null),
            Data::Primitive(p) => Ok(Value::scalar(p.clone())),
            Data::Object(obj) => self.object_to_value(obj.as_ref(), node, depth),
            Data::List(items) => {
                if depth > self.emit_options.max_depth {
                    log::debug!("list at depth {depth} replaced by an empty sequence");
                    return Ok(Value::Sequence(Vec::new()));
                }
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let child_src = src.and_then(|s| s.nested(i));
                    let mut child = fields_of(child_src);
                    out.push(self.data_to_value(item, child_src, &mut child, depth + 1)?);
                    node.insert_nested(i, child);
                }
                Ok(Value::Sequence(out))
            }
            Data::Map(map) => {
                if depth > self.emit_options.max_depth {
                    log::debug!("map at depth {depth} replaced by an empty mapping");
                    return Ok(Value::Mapping(Vec::new()));
                }
                let mut out = Vec::with_capacity(map.len());
                for (key, item) in map {
                    let child_src = src.and_then(|s| s.nested(key));
                    let mut child = fields_of(child_src);
                    out.push((key.clone(), self.data_to_value(item, child_src, &mut child, depth + 1)?));
                    node.insert_nested(key, child);
                }
                Ok(Value::Mapping(out))
            }
        }
    }

    fn convert_out(&self, name: &str, data: &Data, node: &mut MetadataStore) -> Result<Value> {
        let converter = self.converters.resolve(name)?;
        let (raw, tag) = converter.to_yaml(data)?;
        if tag.is_some() {
            node.set_tag(tag);
        }
        Ok(match parse_scalar(&raw, ScalarStyle::Plain, node.tag(), false) {
            Ok(value @ Value::Scalar { .. }) => value,
            _ => Value::string(raw),
        })
    }
}

fn fields_of(src: Option<&MetadataStore>) -> MetadataStore {
    let mut node = MetadataStore::new();
    if let Some(src) = src {
        node.copy_fields_from(src);
    }
    node
}

/// Deserialization pass over one value tree.
struct Builder<'a> {
    registry: &'a TypeRegistry,
    converters: &'a ConverterRegistry,
    max_depth: usize,
}

impl Builder<'_> {
    fn fill_root(
        &self,
        obj: &mut dyn YamlObject,
        value: &Value,
        metadata: &MetadataStore,
    ) -> Result<()> {
        obj.metadata_mut().copy_fields_from(metadata);
        match value {
            Value::Null => Ok(()),
            Value::Mapping(_) => self.populate(obj, value, metadata, &mut Vec::new(), 1),
            Value::Scalar { raw, .. } => Err(Error::msg(format!(
                "{} is built from a mapping, found scalar `{raw}`",
                obj.type_name()
            ))),
            Value::Sequence(_) => Err(Error::msg(format!(
                "{} is built from a mapping, found a sequence",
                obj.type_name()
            ))),
        }
    }

    fn populate(
        &self,
        obj: &mut dyn YamlObject,
        value: &Value,
        meta: &MetadataStore,
        path: &mut Vec<MetaKey>,
        depth: usize,
    ) -> Result<()> {
        if depth > self.max_depth {
            return Err(Error::DepthLimit {
                depth,
                max_depth: self.max_depth,
            });
        }
        let Value::Mapping(entries) = value else {
            return Ok(());
        };
        let descriptors = obj.properties();
        check_key_groups(entries, Some(descriptors), path)?;

        let lookup: HashMap<&str, &Value> = entries.iter().map(|(k, v)| (k.as_str(), v)).collect();

        for descriptor in descriptors {
            if let Some(node) = meta.nested(descriptor.yaml_key()) {
                copy_property_metadata(obj.metadata_mut(), descriptor, node);
            }
        }

        let absent = MetadataStore::new();
        for descriptor in descriptors {
            let key = descriptor.yaml_key();
            let Some(raw) = lookup.get(key.as_str()).copied() else {
                continue;
            };
            let node = meta.nested(key.as_str()).unwrap_or(&absent);
            path.push(MetaKey::from(key.as_str()));

            match descriptor.converter {
                Some(name) => {
                    let data = self.convert_in(name, descriptor, raw, node)?;
                    if let Err(rejected) = obj.set(descriptor.host_name, data) {
                        log::warn!(
                            "converter `{name}` produced {} for `{}`, which holds {}; left unset",
                            rejected.kind_name(),
                            format_path(path),
                            descriptor.property_type
                        );
                    }
                }
                None => {
                    let data = self.build(&descriptor.property_type, raw, node, path, depth + 1)?;
                    assign(obj, descriptor, data, raw, path);
                }
            }
            path.pop();
        }
        Ok(())
    }

    fn convert_in(
        &self,
        name: &str,
        descriptor: &PropertyDescriptor,
        raw: &Value,
        node: &MetadataStore,
    ) -> Result<Data> {
        let converter = self.converters.resolve(name)?;
        let tag = node.tag();
        if !converter.can_handle(tag, &descriptor.property_type) {
            return Err(Error::ConverterMismatch {
                converter: name.to_string(),
                tag: tag.map(str::to_string),
                target_type: descriptor.property_type.to_string(),
            });
        }
        converter.from_yaml(Data::from_value(raw), tag, &descriptor.property_type)
    }

    fn build(
        &self,
        ty: &PropertyType,
        raw: &Value,
        node: &MetadataStore,
        path: &mut Vec<MetaKey>,
        depth: usize,
    ) -> Result<Data> {
        match (ty, raw) {
            (_, Value::Null) => Ok(Data::Null),
            (PropertyType::Object(type_name), Value::Mapping(_)) => {
                let mut child =
                    self.registry
                        .create(type_name)
                        .ok_or_else(|| Error::UnsupportedNestedType {
                            property: format_path(path),
                            type_name: type_name.to_string(),
                        })?;
                self.populate(child.as_mut(), raw, node, path, depth)?;
                Ok(Data::Object(child))
            }
            (PropertyType::List(element), Value::Sequence(items)) => {
                let absent = MetadataStore::new();
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    if matches!(**element, PropertyType::Object(_)) && !matches!(item, Value::Mapping(_)) {
                        log::debug!(
                            "item {i} of `{}` is not a mapping and cannot be {}; skipped",
                            format_path(path),
                            element
                        );
                        continue;
                    }
                    path.push(MetaKey::Index(i));
                    let item_node = node.nested(i).unwrap_or(&absent);
                    out.push(self.build(element, item, item_node, path, depth + 1)?);
                    path.pop();
                }
                Ok(Data::List(out))
            }
            (PropertyType::Map | PropertyType::Any, _) => {
                check_untyped(raw, path)?;
                Ok(Data::from_value(raw))
            }
            (_, Value::Scalar { raw: text, .. }) => Ok(coerce_scalar(ty, raw).unwrap_or_else(|| {
                log::debug!(
                    "`{text}` at `{}` does not read as {ty}; kept as is",
                    format_path(path)
                );
                Data::from_value(raw)
            })),
            _ => Ok(Data::from_value(raw)),
        }
    }
}

/// Assign a built value, retrying with the plain conversion of the raw value.
fn assign(
    obj: &mut dyn YamlObject,
    descriptor: &PropertyDescriptor,
    data: Data,
    raw: &Value,
    path: &[MetaKey],
) {
    let Err(rejected) = obj.set(descriptor.host_name, data) else {
        return;
    };
    let fallback = Data::from_value(raw);
    if fallback != rejected && obj.set(descriptor.host_name, fallback).is_ok() {
        return;
    }
    log::debug!(
        "{} at `{}` does not fit {}; left unset",
        rejected.kind_name(),
        format_path(path),
        descriptor.property_type
    );
}

/// Copy a property's metadata node onto the instance store, keyed by host name.
fn copy_property_metadata(
    target: &mut MetadataStore,
    descriptor: &PropertyDescriptor,
    node: &MetadataStore,
) {
    let host = descriptor.host_name;
    if descriptor.converter.is_some() {
        target.insert_nested(host, node.clone());
        return;
    }
    match &descriptor.property_type {
        PropertyType::Object(_) => target.nested_mut(host).copy_fields_from(node),
        PropertyType::List(element) if matches!(**element, PropertyType::Object(_)) => {
            let slot = target.nested_mut(host);
            slot.copy_fields_from(node);
            for (key, item) in node.children() {
                if let MetaKey::Index(_) = key {
                    slot.nested_mut(key.clone()).copy_fields_from(item);
                }
            }
        }
        _ => target.insert_nested(host, node.clone()),
    }
}

/// Reject case-insensitive key groups not fully bound to explicit property keys.
fn check_key_groups(
    entries: &[(String, Value)],
    descriptors: Option<&[PropertyDescriptor]>,
    path: &[MetaKey],
) -> Result<()> {
    let mut groups: IndexMap<String, Vec<&str>> = IndexMap::new();
    for (key, _) in entries {
        let spellings = groups.entry(key.to_lowercase()).or_default();
        if !spellings.contains(&key.as_str()) {
            spellings.push(key);
        }
    }
    for spellings in groups.values().filter(|s| s.len() > 1) {
        let bound = descriptors.is_some_and(|ds| {
            spellings
                .iter()
                .all(|k| ds.iter().any(|d| d.key == Some(*k)))
        });
        if !bound {
            return Err(Error::DuplicateKey {
                keys: spellings.iter().map(|k| k.to_string()).collect(),
                path: format_path(path),
                location: Location::UNKNOWN,
            });
        }
    }
    Ok(())
}

/// Case collisions inside untyped subtrees can never be bound to properties.
fn check_untyped(value: &Value, path: &mut Vec<MetaKey>) -> Result<()> {
    match value {
        Value::Mapping(entries) => {
            check_key_groups(entries, None, path)?;
            for (key, item) in entries {
                path.push(MetaKey::from(key));
                check_untyped(item, path)?;
                path.pop();
            }
        }
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(MetaKey::Index(i));
                check_untyped(item, path)?;
                path.pop();
            }
        }
        Value::Null | Value::Scalar { .. } => {}
    }
    Ok(())
}

/// Read a scalar as a primitive property type, reparsing its text when the inferred type
/// does not already fit.
fn coerce_scalar(ty: &PropertyType, value: &Value) -> Option<Data> {
    let Value::Scalar { raw, inferred } = value else {
        return None;
    };
    let primitive = match ty {
        PropertyType::String => Primitive::String(raw.clone()),
        PropertyType::Bool => match inferred {
            Primitive::Bool(b) => Primitive::Bool(*b),
            _ => Primitive::Bool(parse_bool_strict(raw)?),
        },
        PropertyType::Int | PropertyType::Long | PropertyType::BigInt => {
            if inferred.is_integer() {
                inferred.clone()
            } else {
                Primitive::from_bigint(parse_bigint(raw)?)
            }
        }
        PropertyType::Decimal | PropertyType::Float => {
            if inferred.is_float() || inferred.is_integer() {
                inferred.clone()
            } else {
                parse_float(raw)?
            }
        }
        PropertyType::Timestamp => match inferred {
            Primitive::Timestamp(t) => Primitive::Timestamp(t.clone()),
            _ => Primitive::Timestamp(parse_timestamp(raw)?),
        },
        PropertyType::Any | PropertyType::Map | PropertyType::Object(_) | PropertyType::List(_) => {
            return None;
        }
    };
    Some(Data::Primitive(primitive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(keys: &[&str]) -> Vec<(String, Value)> {
        keys.iter()
            .map(|k| (k.to_string(), Value::string("v")))
            .collect()
    }

    #[test]
    fn case_groups_need_explicit_keys() {
        let entries = mapping(&["test", "Test", "other"]);
        let err = check_key_groups(&entries, Some(&[] as &[PropertyDescriptor]), &[]).unwrap_err();
        match err {
            Error::DuplicateKey { keys, path, .. } => {
                assert_eq!(keys, vec!["test".to_string(), "Test".to_string()]);
                assert_eq!(path, "");
            }
            other => panic!("unexpected error: {other}"),
        }

        let bound = [
            PropertyDescriptor {
                host_name: "lower",
                key: Some("test"),
                property_type: PropertyType::String,
                converter: None,
            },
            PropertyDescriptor {
                host_name: "upper",
                key: Some("Test"),
                property_type: PropertyType::String,
                converter: None,
            },
        ];
        assert!(check_key_groups(&entries, Some(&bound[..]), &[]).is_ok());
    }

    #[test]
    fn quoted_numbers_coerce_into_numeric_properties() {
        let quoted = Value::string("42");
        assert_eq!(
            coerce_scalar(&PropertyType::Int, &quoted),
            Some(Data::Primitive(Primitive::Int(42)))
        );
        assert_eq!(coerce_scalar(&PropertyType::Bool, &quoted), None);
        assert_eq!(
            coerce_scalar(&PropertyType::String, &Value::scalar(Primitive::Int(7))),
            Some(Data::string("7"))
        );
    }
}
