use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier field carried by every stored document.
pub const ID_FIELD: &str = "_id";
/// Field naming the user that owns a document.
pub const OWNER_FIELD: &str = "userId";
/// Creation timestamp set by the default create mutator.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Opaque entity record backed by a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builds a document from a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn id(&self) -> Option<&str> {
        self.get_str(ID_FIELD)
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.get_str(OWNER_FIELD)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies update data: `null` values unset the field, everything else is set.
    pub fn merge(&mut self, data: &Document) {
        for (field, value) in data.fields() {
            if value.is_null() {
                self.0.remove(field);
            } else {
                self.0.insert(field.clone(), value.clone());
            }
        }
    }

    /// Keeps only the listed fields. The identifier is always retained.
    pub fn project(&self, fields: &[String]) -> Document {
        let mut projected = Map::new();
        for (field, value) in &self.0 {
            if field == ID_FIELD || fields.iter().any(|f| f == field) {
                projected.insert(field.clone(), value.clone());
            }
        }
        Self(projected)
    }

    /// True when every field of `fields` has an equal value in this document.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        fields
            .iter()
            .all(|(field, expected)| self.0.get(field) == Some(expected))
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        document.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Document::from_value(json!([1, 2])).is_none());
        assert!(Document::from_value(json!("x")).is_none());
    }

    #[test]
    fn test_merge_sets_and_unsets() {
        let mut post = doc(json!({"_id": "p1", "title": "Hello", "body": "text"}));
        post.merge(&doc(json!({"title": "Bye", "body": null, "tags": ["a"]})));

        assert_eq!(post.get_str("title"), Some("Bye"));
        assert!(!post.contains("body"));
        assert_eq!(post.get("tags"), Some(&json!(["a"])));
        assert_eq!(post.id(), Some("p1"));
    }

    #[test]
    fn test_project_keeps_identifier() {
        let post = doc(json!({"_id": "p1", "title": "Hello", "userId": "u1"}));
        let projected = post.project(&["title".to_string()]);
        assert_eq!(projected, doc(json!({"_id": "p1", "title": "Hello"})));
    }

    #[test]
    fn test_matches_compares_all_fields() {
        let post = doc(json!({"_id": "p1", "slug": "hello", "userId": "u1"}));
        let selector = json!({"slug": "hello", "userId": "u1"});
        assert!(post.matches(selector.as_object().unwrap()));

        let selector = json!({"slug": "hello", "userId": "u2"});
        assert!(!post.matches(selector.as_object().unwrap()));
    }
}
