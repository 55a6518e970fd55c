//! Tagged-union value carried by command arguments, command results and the
//! condition language.
//!
//! Domain entities (agents, channels, groups, networks) travel as
//! `Value::Reference` so a command can resolve them against live state
//! instead of receiving a stale copy.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Named arguments of one command invocation
pub type Args = BTreeMap<String, Value>;

/// Kind + id of a domain entity owned by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: RefKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: RefKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Agent,
    Channel,
    Group,
    Network,
}

impl RefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::Agent => "agent",
            RefKind::Channel => "channel",
            RefKind::Group => "group",
            RefKind::Network => "network",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "agent" => Some(RefKind::Agent),
            "channel" => Some(RefKind::Channel),
            "group" => Some(RefKind::Group),
            "network" => Some(RefKind::Network),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Reference(EntityRef),
}

impl Value {
    /// Name of the runtime type, as reported in `TypeMismatch` errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Reference(r) => r.kind.as_str(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&EntityRef> {
        match self {
            Value::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Property lookup used by the condition language
    ///
    /// References expose `kind` and `id`; strings and arrays expose `length`.
    pub fn property(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(map) => map.get(name).cloned(),
            Value::Reference(r) => match name {
                "kind" => Some(Value::from(r.kind.as_str())),
                "id" => Some(Value::from(r.id.as_str())),
                _ => None,
            },
            Value::String(s) if name == "length" => Some(Value::Number(s.chars().count() as f64)),
            Value::Array(items) if name == "length" => Some(Value::Number(items.len() as f64)),
            _ => None,
        }
    }

    /// Start building an object value
    pub fn object() -> ObjectBuilder {
        ObjectBuilder::default()
    }
}

/// Fluent construction of `Value::Object`
#[derive(Debug, Default)]
pub struct ObjectBuilder(BTreeMap<String, Value>);

impl ObjectBuilder {
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Reference(r) => write!(f, "{}:{}", r.kind.as_str(), r.id),
            Value::Array(_) | Value::Object(_) => {
                let json = serde_json::Value::from(self.clone());
                write!(f, "{json}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<EntityRef> for Value {
    fn from(r: EntityRef) -> Self {
        Value::Reference(r)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

const REF_TAG: &str = "$ref";

/// JSON objects of the shape `{"$ref": "<kind>", "id": "<id>"}` become references
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                if map.len() == 2 {
                    let kind = map.get(REF_TAG).and_then(|v| v.as_str()).and_then(RefKind::parse);
                    let id = map.get("id").and_then(|v| v.as_str());
                    if let (Some(kind), Some(id)) = (kind, id) {
                        return Value::Reference(EntityRef::new(kind, id));
                    }
                }
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object(map) => {
                serde_json::Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Reference(r) => {
                let mut map = serde_json::Map::new();
                map.insert(REF_TAG.to_string(), r.kind.as_str().into());
                map.insert("id".to_string(), r.id.into());
                serde_json::Value::Object(map)
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

/// Build an `Args` map from `(name, value)` pairs
///
/// ```
/// use cmdflow_core::value::{args, Value};
///
/// let a = args([("name", Value::from("scout")), ("count", Value::from(2))]);
/// assert_eq!(a.len(), 2);
/// ```
pub fn args<I, K>(pairs: I) -> Args
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_from_json_tag() {
        let v = Value::from(json!({"$ref": "channel", "id": "general"}));
        assert_eq!(
            v,
            Value::Reference(EntityRef::new(RefKind::Channel, "general"))
        );
        assert_eq!(v.type_name(), "channel");
    }

    #[test]
    fn test_unknown_ref_kind_stays_object() {
        let v = Value::from(json!({"$ref": "planet", "id": "mars"}));
        assert!(matches!(v, Value::Object(_)));
    }

    #[test]
    fn test_reference_serializes_with_tag() {
        let v = Value::Reference(EntityRef::new(RefKind::Agent, "a1"));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, json!({"$ref": "agent", "id": "a1"}));
    }

    #[test]
    fn test_length_property() {
        assert_eq!(
            Value::from("abc").property("length"),
            Some(Value::Number(3.0))
        );
        assert_eq!(
            Value::from(vec![1, 2]).property("length"),
            Some(Value::Number(2.0))
        );
        assert_eq!(Value::Number(1.0).property("length"), None);
    }

    #[test]
    fn test_display_of_string_is_raw() {
        assert_eq!(Value::from("ok").to_string(), "ok");
        assert_eq!(Value::Number(2.0).to_string(), "2");
    }

    #[test]
    fn test_object_builder() {
        let v = Value::object().field("a", 1).field("b", "x").build();
        assert_eq!(v.property("a"), Some(Value::Number(1.0)));
        assert_eq!(v.property("missing"), None);
    }
}
