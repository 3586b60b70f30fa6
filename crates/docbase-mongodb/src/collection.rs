//! Untyped CRUD over a named collection
//!
//! Every operation works on raw `bson::Document`s so any record shape can be
//! inserted, matched and printed. Filters go through [`validate_query`] and
//! inserted documents through [`validate_document`] before reaching the driver.

use bson::{doc, Bson, Document as BsonDocument};
use docbase_common::Result;
use futures::TryStreamExt;
use mongodb::Collection;
use tracing::debug;

use crate::connection::Connection;
use crate::validation::{validate_document, validate_query, ValidatedCollectionName};

/// A collection resolved lazily against a connection
#[derive(Debug, Clone)]
pub struct CollectionRef {
    inner: Collection<BsonDocument>,
}

impl CollectionRef {
    /// Reference `name` in the connection's current database
    pub fn new(conn: &Connection, name: &ValidatedCollectionName) -> Self {
        Self {
            inner: conn.collection(name.as_str()),
        }
    }

    /// Collection name
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The underlying driver collection
    pub fn inner(&self) -> &Collection<BsonDocument> {
        &self.inner
    }

    /// Insert one document, returning its `_id`
    pub async fn insert_one(&self, document: BsonDocument) -> Result<Bson> {
        validate_document(&document)?;
        let result = self.inner.insert_one(document).await?;
        debug!(collection = %self.name(), id = %result.inserted_id, "inserted one");
        Ok(result.inserted_id)
    }

    /// Insert a batch of documents, returning their `_id`s in input order
    ///
    /// An empty batch is a no-op; the driver would reject it.
    pub async fn insert_many(&self, documents: Vec<BsonDocument>) -> Result<Vec<Bson>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        for document in &documents {
            validate_document(document)?;
        }

        let result = self.inner.insert_many(documents).await?;

        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);
        debug!(collection = %self.name(), count = ids.len(), "inserted many");
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    /// Delete the first document matching `filter`; returns 0 or 1
    pub async fn delete_one(&self, filter: BsonDocument) -> Result<u64> {
        validate_query(&filter)?;
        let result = self.inner.delete_one(filter).await?;
        debug!(collection = %self.name(), deleted = result.deleted_count, "delete one");
        Ok(result.deleted_count)
    }

    /// Delete every document matching `filter`
    pub async fn delete_many(&self, filter: BsonDocument) -> Result<u64> {
        validate_query(&filter)?;
        let result = self.inner.delete_many(filter).await?;
        debug!(collection = %self.name(), deleted = result.deleted_count, "delete many");
        Ok(result.deleted_count)
    }

    /// Empty the collection
    pub async fn delete_all(&self) -> Result<u64> {
        self.delete_many(doc! {}).await
    }

    /// All documents matching `filter`, in server order
    pub async fn find(&self, filter: BsonDocument) -> Result<Vec<BsonDocument>> {
        validate_query(&filter)?;
        let cursor = self.inner.find(filter).await?;
        let docs: Vec<BsonDocument> = cursor.try_collect().await?;
        debug!(collection = %self.name(), count = docs.len(), "find");
        Ok(docs)
    }

    /// Every document in the collection
    pub async fn find_all(&self) -> Result<Vec<BsonDocument>> {
        self.find(doc! {}).await
    }

    /// Count documents matching `filter`
    pub async fn count(&self, filter: BsonDocument) -> Result<u64> {
        validate_query(&filter)?;
        let count = self.inner.count_documents(filter).await?;
        Ok(count)
    }
}
