//! Document store client.
//!
//! The repository talks to the database through [`DocumentStore`], a small
//! set of single-document primitives filtered by the `path` field. Two
//! backends exist:
//!
//! | Backend | Selected by | Notes |
//! |---|---|---|
//! | [`MemoryStore`] | `DB_URI=memory://…` | in-process, unique index on `path` |
//! | `MongoStore` | any other URI | `mongodb` cargo feature, on by default |

mod memory;
#[cfg(feature = "mongodb")]
mod mongo;
mod update;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::StoreConfig;
use crate::document::Document;
use crate::error::StoreError;

pub use memory::MemoryStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;

/// URI scheme that selects the in-process backend.
pub const MEMORY_SCHEME: &str = "memory://";

/// Deadline for the startup ping.
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Single-document primitives against one configured collection.
///
/// Every method filters on exact equality of the `path` field. Implementations
/// must be safe to share between concurrent requests; no locking happens
/// above this layer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Round-trips to the server to verify the connection.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_one(&self, path: &str) -> Result<Option<Document>, StoreError>;

    async fn insert_one(&self, doc: Document) -> Result<(), StoreError>;

    /// Replaces the whole document. Returns the matched count.
    async fn replace_one(&self, path: &str, doc: Document) -> Result<u64, StoreError>;

    /// Applies `update` as an update document. Returns the matched count.
    ///
    /// A refused update must be reported as [`StoreError::UpdateRejected`]
    /// and leave the stored document untouched.
    async fn update_one(&self, path: &str, update: Map<String, Value>) -> Result<u64, StoreError>;

    /// Returns the deleted count (0 or 1).
    async fn delete_one(&self, path: &str) -> Result<u64, StoreError>;

    /// Releases the connection. The default does nothing.
    async fn shutdown(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Human-readable target for startup logs, e.g. `memory://simple_crud.simple_crud`.
    fn describe(&self) -> String;
}

/// Connects the backend selected by `config.uri`.
pub async fn connect(config: &StoreConfig) -> crate::Result<Arc<dyn DocumentStore>> {
    if config.uri.starts_with(MEMORY_SCHEME) {
        return Ok(Arc::new(MemoryStore::new(&config.database, &config.collection)));
    }
    connect_remote(config).await
}

/// Pings the store, giving up after `deadline`.
pub async fn verify(store: &dyn DocumentStore, deadline: Duration) -> crate::Result<()> {
    let started = Instant::now();
    match tokio::time::timeout(deadline, store.ping()).await {
        Ok(pinged) => Ok(pinged?),
        Err(_) => Err(crate::Error::Timeout { operation: "ping", elapsed: started.elapsed() }),
    }
}

#[cfg(feature = "mongodb")]
async fn connect_remote(config: &StoreConfig) -> crate::Result<Arc<dyn DocumentStore>> {
    Ok(Arc::new(MongoStore::connect(config).await?))
}

#[cfg(not(feature = "mongodb"))]
async fn connect_remote(config: &StoreConfig) -> crate::Result<Arc<dyn DocumentStore>> {
    Err(crate::Error::config(format!(
        "cannot connect to {}: built without the `mongodb` feature (use a {MEMORY_SCHEME} URI instead)",
        config.uri
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store_config(uri: &str) -> StoreConfig {
        StoreConfig {
            uri: uri.to_owned(),
            database: "db".to_owned(),
            collection: "docs".to_owned(),
            username: "admin".to_owned(),
            password: "admin".to_owned(),
            timeout: Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn memory_uri_selects_memory_store() {
        let store = connect(&store_config("memory://")).await.unwrap();
        assert_eq!(store.describe(), "memory://db.docs");
        store.ping().await.unwrap();
    }

    struct Unreachable;

    #[async_trait]
    impl DocumentStore for Unreachable {
        async fn ping(&self) -> Result<(), StoreError> {
            std::future::pending().await
        }
        async fn find_one(&self, _: &str) -> Result<Option<Document>, StoreError> {
            unreachable!()
        }
        async fn insert_one(&self, _: Document) -> Result<(), StoreError> {
            unreachable!()
        }
        async fn replace_one(&self, _: &str, _: Document) -> Result<u64, StoreError> {
            unreachable!()
        }
        async fn update_one(&self, _: &str, _: Map<String, Value>) -> Result<u64, StoreError> {
            unreachable!()
        }
        async fn delete_one(&self, _: &str) -> Result<u64, StoreError> {
            unreachable!()
        }
        fn describe(&self) -> String {
            "unreachable".into()
        }
    }

    #[tokio::test]
    async fn startup_ping_has_a_deadline() {
        let err = verify(&Unreachable, Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, crate::Error::Timeout { operation: "ping", .. }));
        verify(&MemoryStore::new("db", "docs"), PING_TIMEOUT).await.unwrap();
    }

    // The driver connects lazily, so the default URI resolves without a server.
    #[cfg(feature = "mongodb")]
    #[tokio::test]
    async fn default_uri_selects_mongo_store() {
        let uri = crate::config::DEFAULT_DB_URI;
        let store = connect(&store_config(uri)).await.unwrap();
        assert!(store.describe().starts_with(uri));
    }

    #[cfg(not(feature = "mongodb"))]
    #[tokio::test]
    async fn remote_uri_without_driver_is_a_config_error() {
        let err = connect(&store_config("mongodb://127.0.0.1:27017")).await.err().unwrap();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
