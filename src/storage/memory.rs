use super::connector::{Collection, Selector};
use crate::core::{Document, ID_FIELD, MutationError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory document collection keyed by `_id`.
pub struct MemoryCollection {
    name: String,
    documents: RwLock<BTreeMap<String, Document>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// Access counters of a [`MemoryCollection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStats {
    pub documents: usize,
    pub reads: usize,
    pub writes: usize,
}

impl std::fmt::Display for CollectionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Collection Stats: {} documents, {} reads, {} writes",
            self.documents, self.reads, self.writes
        )
    }
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(BTreeMap::new()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Creates a collection pre-filled with documents, without touching counters
    pub fn with_documents(name: impl Into<String>, documents: impl IntoIterator<Item = Document>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for document in documents {
            let id = document
                .id()
                .ok_or_else(|| MutationError::InvalidInput("Seed document without _id".into()))?
                .to_string();
            map.insert(id, document);
        }

        Ok(Self {
            documents: RwLock::new(map),
            ..Self::new(name)
        })
    }

    /// Snapshot of a document, bypassing counters
    pub async fn peek(&self, document_id: &str) -> Option<Document> {
        self.documents.read().await.get(document_id).cloned()
    }

    pub async fn stats(&self) -> CollectionStats {
        CollectionStats {
            documents: self.documents.read().await.len(),
            reads: self.reads.load(Ordering::SeqCst),
            writes: self.writes.load(Ordering::SeqCst),
        }
    }

    /// Total calls made through the [`Collection`] trait
    pub fn access_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst) + self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(&self, selector: &Selector) -> Result<Option<Document>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let documents = self.documents.read().await;

        if let Some(id) = &selector.document_id {
            return Ok(documents
                .get(id)
                .filter(|doc| selector.matches(doc))
                .cloned());
        }

        Ok(documents.values().find(|doc| selector.matches(doc)).cloned())
    }

    async fn insert(&self, mut document: Document) -> Result<Document> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let id = match document.id() {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                document.set(ID_FIELD, id.clone());
                id
            }
        };

        let mut documents = self.documents.write().await;
        if documents.contains_key(&id) {
            return Err(MutationError::Storage(format!(
                "Document '{}' already exists in '{}'",
                id, self.name
            )));
        }

        documents.insert(id, document.clone());
        Ok(document)
    }

    async fn update(&self, document_id: &str, data: &Document) -> Result<Document> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut documents = self.documents.write().await;

        let document = documents.get_mut(document_id).ok_or_else(|| {
            MutationError::Storage(format!(
                "Document '{}' not found in '{}'",
                document_id, self.name
            ))
        })?;

        let mut data = data.clone();
        // identifiers are immutable
        data.remove(ID_FIELD);
        document.merge(&data);

        Ok(document.clone())
    }

    async fn remove(&self, document_id: &str) -> Result<Option<Document>> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut documents = self.documents.write().await;
        Ok(documents.remove(document_id))
    }
}
