//! Custom property converters.
//!
//! A property bound to a converter (`#[yaml(converter = "name")]` in [`yaml_object!`](crate::yaml_object!))
//! bypasses built-in coercion in both directions. Converters are registered by name on the
//! [`Mapper`](crate::Mapper) before any document is mapped.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::object::{Data, PropertyType};

pub trait Converter: Send + Sync {
    /// Whether this converter accepts a value carrying `tag` for a property of `target` type.
    fn can_handle(&self, tag: Option<&str>, target: &PropertyType) -> bool;

    /// Build the property value from document data.
    fn from_yaml(&self, data: Data, tag: Option<&str>, target: &PropertyType) -> Result<Data>;

    /// Scalar text for the property value plus the tag to write with it.
    fn to_yaml(&self, value: &Data) -> Result<(String, Option<String>)>;
}

/// Named converters.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `converter` under `name`, replacing any previous one.
    pub fn register<C: Converter + 'static>(&mut self, name: impl Into<String>, converter: C) {
        self.converters.insert(name.into(), Arc::new(converter));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Converter>> {
        self.converters
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ConverterResolution {
                name: name.to_string(),
            })
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.converters.keys().collect();
        names.sort();
        f.debug_struct("ConverterRegistry")
            .field("converters", &names)
            .finish()
    }
}
