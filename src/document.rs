//! The stored document shape.
//!
//! A document is an arbitrary JSON object plus one reserved field, `path`,
//! holding the request target it is keyed by.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the reserved key field.
pub const PATH_FIELD: &str = "path";

/// A JSON object persisted in the collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps `body` and sets its `path` field to `path`, overwriting any
    /// value the client sent.
    pub fn keyed(path: &str, body: Map<String, Value>) -> Self {
        let mut doc = Self(body);
        doc.0.insert(PATH_FIELD.to_owned(), Value::String(path.to_owned()));
        doc
    }

    /// The `path` field, if present and a string.
    pub fn path(&self) -> Option<&str> {
        self.0.get(PATH_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn keyed_injects_path() {
        let doc = Document::keyed("/a", object(json!({"x": 1})));
        assert_eq!(doc.path(), Some("/a"));
        assert_eq!(Value::from(doc), json!({"x": 1, "path": "/a"}));
    }

    #[test]
    fn keyed_overwrites_client_supplied_path() {
        let doc = Document::keyed("/real", object(json!({"path": "/spoofed"})));
        assert_eq!(doc.path(), Some("/real"));
    }

    #[test]
    fn serializes_as_plain_object() {
        let doc = Document::keyed("/a?b=c", Map::new());
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"path":"/a?b=c"}"#);
    }
}
