//! Document trait and the `User` model
//!
//! This module provides the `Document` trait that typed MongoDB records
//! implement. It supports CRUD operations with automatic BSON serialization.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document as BsonDocument};
use docbase_common::{DocbaseError, Result};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::validation::validate_query;

/// Core trait for typed MongoDB documents
///
/// Implementing types must be Serialize + DeserializeOwned to enable automatic
/// BSON conversion.
///
/// # Example
///
/// ```ignore
/// use serde::{Deserialize, Serialize};
/// use docbase_mongodb::Document;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Post {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     id: Option<ObjectId>,
///     title: String,
/// }
///
/// impl Document for Post {
///     fn collection_name() -> &'static str {
///         "posts"
///     }
/// }
/// ```
#[async_trait]
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Sized {
    /// Get the collection name for this document type
    fn collection_name() -> &'static str;

    /// Get the document's ObjectId (if it has one)
    fn get_id(&self) -> Option<ObjectId> {
        None
    }

    /// Set the document's ObjectId
    fn set_id(&mut self, _id: ObjectId) {}

    /// Convert document to BSON
    fn to_bson(&self) -> Result<BsonDocument> {
        bson::to_document(self).map_err(|e| DocbaseError::Serialization(e.to_string()))
    }

    /// Create document from BSON
    fn from_bson(doc: BsonDocument) -> Result<Self> {
        bson::from_document(doc).map_err(|e| DocbaseError::Deserialization(e.to_string()))
    }

    /// Get the untyped collection for this document
    fn collection(db: &Database) -> Collection<BsonDocument> {
        db.collection(Self::collection_name())
    }

    /// Insert this document into the database
    ///
    /// Returns the ObjectId of the inserted document
    async fn insert_one(&mut self, db: &Database) -> Result<ObjectId> {
        let collection = Self::collection(db);
        let bson_doc = self.to_bson()?;

        let result = collection.insert_one(bson_doc).await?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| DocbaseError::Database("Invalid inserted ID".to_string()))?;

        self.set_id(id);

        Ok(id)
    }

    /// Insert a batch of documents, assigning each its new ObjectId
    async fn insert_many(docs: &mut [Self], db: &Database) -> Result<Vec<ObjectId>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        let collection = Self::collection(db);
        let bson_docs = docs
            .iter()
            .map(|d| d.to_bson())
            .collect::<Result<Vec<_>>>()?;

        let result = collection.insert_many(bson_docs).await?;

        let mut ids = Vec::with_capacity(docs.len());
        for (index, doc) in docs.iter_mut().enumerate() {
            let id = result
                .inserted_ids
                .get(&index)
                .and_then(|id| id.as_object_id())
                .ok_or_else(|| {
                    DocbaseError::Database(format!("Missing inserted ID at index {}", index))
                })?;
            doc.set_id(id);
            ids.push(id);
        }

        Ok(ids)
    }

    /// Find a single document matching the filter
    async fn find_one(db: &Database, filter: BsonDocument) -> Result<Option<Self>> {
        validate_query(&filter)?;
        let collection = Self::collection(db);

        match collection.find_one(filter).await? {
            Some(doc) => Ok(Some(Self::from_bson(doc)?)),
            None => Ok(None),
        }
    }

    /// Find all documents matching the filter
    async fn find(db: &Database, filter: BsonDocument) -> Result<Vec<Self>> {
        validate_query(&filter)?;
        let collection = Self::collection(db);

        let cursor = collection.find(filter).await?;
        let docs: Vec<BsonDocument> = cursor.try_collect().await?;

        docs.into_iter().map(Self::from_bson).collect()
    }

    /// Find all documents in the collection
    async fn find_all(db: &Database) -> Result<Vec<Self>> {
        Self::find(db, doc! {}).await
    }

    /// Delete a single document matching the filter
    ///
    /// Returns true if a document was deleted
    async fn delete_one(db: &Database, filter: BsonDocument) -> Result<bool> {
        validate_query(&filter)?;
        let result = Self::collection(db).delete_one(filter).await?;
        Ok(result.deleted_count > 0)
    }

    /// Delete every document matching the filter, returning how many went
    async fn delete_many(db: &Database, filter: BsonDocument) -> Result<u64> {
        validate_query(&filter)?;
        let result = Self::collection(db).delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    /// Empty the collection
    async fn delete_all(db: &Database) -> Result<u64> {
        Self::delete_many(db, doc! {}).await
    }

    /// Count documents matching the filter
    async fn count(db: &Database, filter: BsonDocument) -> Result<u64> {
        validate_query(&filter)?;
        let count = Self::collection(db).count_documents(filter).await?;
        Ok(count)
    }
}

/// A tutorial user: nothing but a username
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
        }
    }

    /// Filter matching users with this username
    pub fn filter_by_username(username: &str) -> BsonDocument {
        doc! { "username": username }
    }
}

impl Document for User {
    fn collection_name() -> &'static str {
        "users"
    }

    fn get_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }
}
