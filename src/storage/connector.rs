use crate::core::{Document, ID_FIELD, MutationError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifies a document either by `documentId` or by field equality.
///
/// Deserializes from the GraphQL-style selector argument:
/// `{ "documentId": "p1" }` or `{ "slug": "hello" }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Selector {
    pub fn by_id(document_id: impl Into<String>) -> Self {
        Self {
            document_id: Some(document_id.into()),
            fields: Map::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.document_id.is_none() && self.fields.is_empty()
    }

    pub fn matches(&self, document: &Document) -> bool {
        if let Some(id) = &self.document_id {
            if document.id() != Some(id.as_str()) {
                return false;
            }
        }
        document.matches(&self.fields)
    }
}

/// Read options for [`Connectors::get`].
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Restrict the returned document to these fields (`_id` is always kept)
    pub fields: Option<Vec<String>>,
}

impl GetOptions {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: Some(fields.into_iter().map(Into::into).collect()),
        }
    }

    /// Projection used when only existence matters
    pub fn id_only() -> Self {
        Self::fields([ID_FIELD])
    }
}

/// A storage collection handle.
#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    /// First document matching the selector
    async fn find_one(&self, selector: &Selector) -> Result<Option<Document>>;

    /// Stores a new document, assigning `_id` when absent
    async fn insert(&self, document: Document) -> Result<Document>;

    /// Merges `data` into the stored document and returns the new state
    async fn update(&self, document_id: &str, data: &Document) -> Result<Document>;

    /// Removes a document, returning it if it existed
    async fn remove(&self, document_id: &str) -> Result<Option<Document>>;
}

/// Read helpers over any [`Collection`].
pub struct Connectors;

impl Connectors {
    /// Fetches one document by selector. An empty selector is rejected
    /// rather than matching an arbitrary document.
    ///
    /// # Examples
    ///
    /// ```
    /// use docmutate::{Connectors, Document, GetOptions, MemoryCollection, Selector};
    ///
    /// # tokio_test::block_on(async {
    /// let posts = MemoryCollection::with_documents(
    ///     "Posts",
    ///     [Document::new().with("_id", "p1").with("slug", "hello")],
    /// ).unwrap();
    ///
    /// let selector = Selector::default().field("slug", "hello");
    /// let found = Connectors::get(&posts, &selector, GetOptions::id_only()).await.unwrap();
    /// assert_eq!(found, Some(Document::new().with("_id", "p1")));
    /// # });
    /// ```
    pub async fn get(
        collection: &dyn Collection,
        selector: &Selector,
        options: GetOptions,
    ) -> Result<Option<Document>> {
        if selector.is_empty() {
            return Err(MutationError::InvalidInput(format!(
                "Empty selector for collection '{}'",
                collection.name()
            )));
        }

        let document = collection.find_one(selector).await?;
        Ok(match options.fields {
            Some(fields) => document.map(|doc| doc.project(&fields)),
            None => document,
        })
    }

    pub async fn get_by_id(collection: &dyn Collection, document_id: &str) -> Result<Option<Document>> {
        Self::get(collection, &Selector::by_id(document_id), GetOptions::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selector_deserializes_document_id_and_fields() {
        let selector: Selector = serde_json::from_value(json!({"documentId": "p1"})).unwrap();
        assert_eq!(selector, Selector::by_id("p1"));

        let selector: Selector = serde_json::from_value(json!({"slug": "hello"})).unwrap();
        assert_eq!(selector.document_id, None);
        assert_eq!(selector.fields.get("slug"), Some(&json!("hello")));
    }

    #[test]
    fn test_selector_matching() {
        let doc = Document::from_value(json!({"_id": "p1", "slug": "hello"})).unwrap();
        assert!(Selector::by_id("p1").matches(&doc));
        assert!(!Selector::by_id("p2").matches(&doc));
        assert!(Selector::default().field("slug", "hello").matches(&doc));
        assert!(!Selector::by_id("p1").field("slug", "bye").matches(&doc));
        assert!(Selector::default().is_empty());
    }
}
