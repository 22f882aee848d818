//! In-process document store.
//!
//! One `HashMap` keyed by `path` behind a `parking_lot::RwLock`. Keying the
//! map by `path` is the collection's unique index: a second insert for the
//! same path fails with [`StoreError::DuplicateKey`] instead of creating a
//! duplicate. Each primitive takes the lock once, so every single operation
//! is atomic; sequences of operations are not.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::trace;

use super::{update, DocumentStore, MEMORY_SCHEME};
use crate::document::Document;
use crate::error::StoreError;

pub struct MemoryStore {
    namespace: String,
    docs: RwLock<HashMap<String, Document>>,
}

impl MemoryStore {
    pub fn new(database: &str, collection: &str) -> Self {
        Self {
            namespace: format!("{database}.{collection}"),
            docs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

fn key_of(doc: &Document) -> Result<String, StoreError> {
    doc.path()
        .map(str::to_owned)
        .ok_or_else(|| StoreError::Backend("document has no string `path` field".into()))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_one(&self, path: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.docs.read().get(path).cloned())
    }

    async fn insert_one(&self, doc: Document) -> Result<(), StoreError> {
        let key = key_of(&doc)?;
        let mut docs = self.docs.write();
        if docs.contains_key(&key) {
            return Err(StoreError::DuplicateKey(key));
        }
        trace!(ns = %self.namespace, path = %key, "insert");
        docs.insert(key, doc);
        Ok(())
    }

    async fn replace_one(&self, path: &str, doc: Document) -> Result<u64, StoreError> {
        let key = key_of(&doc)?;
        let mut docs = self.docs.write();
        if !docs.contains_key(path) {
            return Ok(0);
        }
        if key != path && docs.contains_key(&key) {
            return Err(StoreError::DuplicateKey(key));
        }
        docs.remove(path);
        docs.insert(key, doc);
        Ok(1)
    }

    async fn update_one(&self, path: &str, changes: Map<String, Value>) -> Result<u64, StoreError> {
        let mut docs = self.docs.write();
        let Some(current) = docs.get(path) else {
            return Ok(0);
        };
        let updated = Document::from(update::apply(current.as_map(), &changes)?);
        let key = updated.path().map(str::to_owned).ok_or_else(|| {
            StoreError::UpdateRejected("the 'path' field is the collection key and must remain a string".into())
        })?;
        if key != path && docs.contains_key(&key) {
            return Err(StoreError::DuplicateKey(key));
        }
        docs.remove(path);
        docs.insert(key, updated);
        Ok(1)
    }

    async fn delete_one(&self, path: &str) -> Result<u64, StoreError> {
        Ok(u64::from(self.docs.write().remove(path).is_some()))
    }

    fn describe(&self) -> String {
        format!("{MEMORY_SCHEME}{}", self.namespace)
    }
}
