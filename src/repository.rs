//! Path-keyed repository.
//!
//! Maps `(path, body)` operations onto [`DocumentStore`] primitives. Every
//! store call gets its own deadline; a request that makes three calls may
//! take up to three deadlines in total.
//!
//! Writes look the path up first and then insert or update. The two steps
//! are not atomic: concurrent first writers to a new path both see "absent"
//! and both insert, and the store's unique index on `path` decides which
//! insert fails.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;

use crate::document::Document;
use crate::envelope::{Envelope, Reply};
use crate::error::{Error, Result, StoreError};
use crate::status::Status;
use crate::store::DocumentStore;

/// The four CRUD operations over one collection.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Runs one store call under the per-operation deadline.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> Result<std::result::Result<T, StoreError>> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| Error::Timeout { operation, elapsed: self.timeout })
    }

    async fn find(&self, path: &str) -> Result<Option<Document>> {
        Ok(self.bounded("find_one", self.store.find_one(path)).await??)
    }

    /// The stored document for `path`, or a 404 envelope.
    pub async fn get(&self, path: &str) -> Result<Reply> {
        Ok(match self.find(path).await? {
            Some(doc) => Reply::Document(doc),
            None => Envelope::not_found().into(),
        })
    }

    /// Full-replace upsert: afterwards exactly `body` plus `path` is stored.
    pub async fn create_or_overwrite(&self, path: &str, body: Option<Map<String, Value>>) -> Result<Reply> {
        let doc = Document::keyed(path, body.unwrap_or_default());

        if self.find(path).await?.is_none() {
            debug!(path, "insert");
            self.bounded("insert_one", self.store.insert_one(doc)).await??;
        } else {
            debug!(path, "replace");
            self.bounded("replace_one", self.store.replace_one(path, doc)).await??;
        }
        Ok(Envelope::ok().into())
    }

    /// Insert when absent, otherwise hand `body` to the store as an update
    /// document. A refused update is answered with 400 and the store's text.
    pub async fn create_or_merge(&self, path: &str, body: Option<Map<String, Value>>) -> Result<Reply> {
        let body = body.unwrap_or_default();

        if self.find(path).await?.is_none() {
            debug!(path, "insert");
            self.bounded("insert_one", self.store.insert_one(Document::keyed(path, body)))
                .await??;
            return Ok(Envelope::ok().into());
        }

        debug!(path, "update");
        match self.bounded("update_one", self.store.update_one(path, body)).await? {
            Ok(_) => Ok(Envelope::ok().into()),
            Err(e) => Ok(Envelope::new(e.to_string(), Status::BadRequest).into()),
        }
    }

    /// Removes the document for `path`, reporting how many were deleted.
    pub async fn delete(&self, path: &str) -> Result<Reply> {
        let count = self.bounded("delete_one", self.store.delete_one(path)).await??;
        Ok(Envelope::deleted(count).into())
    }
}
