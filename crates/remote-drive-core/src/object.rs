//! Structured values returned by, and passed into, a remote session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::SecurityDescriptor;

/// Property carrying the provider-qualified path of an item.
pub const PATH_PROPERTY: &str = "PSPath";

/// Property carrying the container flag of an item.
pub const CONTAINER_PROPERTY: &str = "PSIsContainer";

/// Property carrying the leaf name of an item.
pub const NAME_PROPERTY: &str = "Name";

/// A structured result object produced by remote execution.
///
/// Only `base` and a handful of well-known properties are ever read by the
/// dispatcher. Everything else rides along untouched in `properties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// The wrapped base value (a scalar for queries like `Test-Path`).
    #[serde(default)]
    pub base: Value,

    /// Open-ended property bag.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl RemoteObject {
    /// Wrap a bare value with no properties.
    #[must_use]
    pub fn new(base: impl Into<Value>) -> Self {
        Self {
            base: base.into(),
            properties: Map::new(),
        }
    }

    /// An item-shaped object carrying a path and container flag.
    #[must_use]
    pub fn item(path: impl Into<String>, is_container: bool) -> Self {
        Self::new(Value::Null)
            .with_property(PATH_PROPERTY, path.into())
            .with_property(CONTAINER_PROPERTY, is_container)
    }

    /// Add a property, builder style.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(name, value);
        self
    }

    /// Set a property.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Get a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// The `PSPath` property, if present and a string.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.property(PATH_PROPERTY).and_then(Value::as_str)
    }

    /// The `PSIsContainer` property, if present and a boolean.
    #[must_use]
    pub fn is_container(&self) -> Option<bool> {
        self.property(CONTAINER_PROPERTY).and_then(Value::as_bool)
    }

    /// The `Name` property, if present.
    #[must_use]
    pub fn name(&self) -> Option<&Value> {
        self.property(NAME_PROPERTY)
    }
}

impl From<Value> for RemoteObject {
    fn from(base: Value) -> Self {
        Self::new(base)
    }
}

/// A local value that can be bound into the remote variable namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RemoteValue {
    /// `$null`.
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<RemoteValue>),
    SecurityDescriptor(SecurityDescriptor),
    Object(RemoteObject),
}

impl RemoteValue {
    /// A list of strings, e.g. property names.
    #[must_use]
    pub fn string_list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::String(s.into())).collect())
    }
}

impl From<Value> for RemoteValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::String(n.to_string()), Self::Int),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            obj @ Value::Object(_) => Self::Object(RemoteObject::new(obj)),
        }
    }
}

impl From<RemoteObject> for RemoteValue {
    fn from(obj: RemoteObject) -> Self {
        Self::Object(obj)
    }
}

impl From<SecurityDescriptor> for RemoteValue {
    fn from(sd: SecurityDescriptor) -> Self {
        Self::SecurityDescriptor(sd)
    }
}

impl From<bool> for RemoteValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for RemoteValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for RemoteValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_item_accessors() {
        let obj = RemoteObject::item("FileSystem::/data/a.txt", false).with_property("Name", "a.txt");
        assert_eq!(obj.path(), Some("FileSystem::/data/a.txt"));
        assert_eq!(obj.is_container(), Some(false));
        assert_eq!(obj.name(), Some(&json!("a.txt")));
    }

    #[test]
    fn test_mistyped_container_flag_is_absent() {
        let obj = RemoteObject::new(Value::Null).with_property(CONTAINER_PROPERTY, "yes");
        assert_eq!(obj.is_container(), None);
        assert_eq!(obj.path(), None);
    }

    #[test]
    fn test_value_from_json() {
        assert_eq!(RemoteValue::from(json!(3)), RemoteValue::Int(3));
        assert_eq!(RemoteValue::from(json!("x")), RemoteValue::String("x".into()));
        assert_eq!(
            RemoteValue::from(json!(["a", true])),
            RemoteValue::List(vec![RemoteValue::String("a".into()), RemoteValue::Bool(true)])
        );
        assert_eq!(RemoteValue::from(json!(1.5)), RemoteValue::String("1.5".into()));
    }

    #[test]
    fn test_value_serialization() {
        let value = RemoteValue::string_list(["Length", "Mode"]);
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains("\"kind\":\"list\""));

        let parsed: RemoteValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, value);
    }
}
