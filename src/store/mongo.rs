//! MongoDB backend, built with `--features mongodb`.
//!
//! Documents cross the boundary as BSON: JSON bodies are serialized with
//! `bson::to_document`, stored documents come back as relaxed extended JSON
//! with every ObjectId flattened to its hex string, so `_id` reads as
//! `"65f0a1b2c3d4e5f601234567"` rather than `{"$oid": …}`.

use async_trait::async_trait;
use mongodb::bson::{self, doc, Bson, Document as BsonDocument};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use serde_json::{Map, Value};
use tracing::debug;

use super::DocumentStore;
use crate::config::StoreConfig;
use crate::document::{Document, PATH_FIELD};
use crate::error::StoreError;

pub struct MongoStore {
    client: Client,
    collection: Collection<BsonDocument>,
    target: String,
}

impl MongoStore {
    /// Builds the client from `config.uri`. The driver connects lazily; call
    /// [`DocumentStore::ping`] to verify the server is reachable.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let client = Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;
        let collection = client.database(&config.database).collection::<BsonDocument>(&config.collection);
        debug!(uri = %config.uri, "mongodb client created");
        Ok(Self {
            client,
            collection,
            target: format!("{} ({}.{})", config.uri, config.database, config.collection),
        })
    }
}

fn by_path(path: &str) -> BsonDocument {
    let mut filter = BsonDocument::new();
    filter.insert(PATH_FIELD, path);
    filter
}

fn to_bson(value: &impl serde::Serialize) -> Result<BsonDocument, StoreError> {
    bson::to_document(value).map_err(|e| StoreError::Conversion(e.to_string()))
}

fn flatten_ids(value: Bson) -> Bson {
    match value {
        Bson::ObjectId(oid) => Bson::String(oid.to_hex()),
        Bson::Document(doc) => Bson::Document(doc.into_iter().map(|(k, v)| (k, flatten_ids(v))).collect()),
        Bson::Array(items) => Bson::Array(items.into_iter().map(flatten_ids).collect()),
        other => other,
    }
}

fn from_bson(doc: BsonDocument) -> Result<Document, StoreError> {
    match flatten_ids(Bson::Document(doc)).into_relaxed_extjson() {
        Value::Object(map) => Ok(Document::from(map)),
        other => Err(StoreError::Conversion(format!("expected an object, got {other}"))),
    }
}

fn backend(e: mongodb::error::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    async fn find_one(&self, path: &str) -> Result<Option<Document>, StoreError> {
        self.collection
            .find_one(by_path(path), None)
            .await
            .map_err(backend)?
            .map(from_bson)
            .transpose()
    }

    async fn insert_one(&self, doc: Document) -> Result<(), StoreError> {
        self.collection.insert_one(to_bson(&doc)?, None).await.map_err(backend)?;
        Ok(())
    }

    async fn replace_one(&self, path: &str, doc: Document) -> Result<u64, StoreError> {
        let res = self
            .collection
            .replace_one(by_path(path), to_bson(&doc)?, None)
            .await
            .map_err(backend)?;
        Ok(res.matched_count)
    }

    async fn update_one(&self, path: &str, update: Map<String, Value>) -> Result<u64, StoreError> {
        let update = to_bson(&update).map_err(|e| StoreError::UpdateRejected(e.to_string()))?;
        let res = self
            .collection
            .update_one(by_path(path), update, None)
            .await
            .map_err(|e| StoreError::UpdateRejected(e.to_string()))?;
        Ok(res.matched_count)
    }

    async fn delete_one(&self, path: &str) -> Result<u64, StoreError> {
        let res = self.collection.delete_one(by_path(path), None).await.map_err(backend)?;
        Ok(res.deleted_count)
    }

    async fn shutdown(&self) -> Result<(), StoreError> {
        self.client.clone().shutdown().await;
        Ok(())
    }

    fn describe(&self) -> String {
        self.target.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    #[test]
    fn object_ids_read_as_hex_strings() {
        let id = ObjectId::parse_str("65f0a1b2c3d4e5f601234567").unwrap();
        let stored = doc! { "_id": id, "path": "/x", "refs": [id], "meta": { "owner": id, "n": 3 } };
        assert_eq!(
            Value::from(from_bson(stored).unwrap()),
            json!({
                "_id": "65f0a1b2c3d4e5f601234567",
                "path": "/x",
                "refs": ["65f0a1b2c3d4e5f601234567"],
                "meta": { "owner": "65f0a1b2c3d4e5f601234567", "n": 3 },
            })
        );
    }

    #[test]
    fn path_filter_is_exact() {
        assert_eq!(by_path("/a?b=1"), doc! { "path": "/a?b=1" });
    }
}
