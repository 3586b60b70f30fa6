//! Query builder for MongoDB find operations

use bson::Document as BsonDocument;
use docbase_common::Result;
use mongodb::{options::FindOptions, Collection, Database};
use tracing::debug;

use crate::validation::validate_query;

/// Query builder for MongoDB find operations
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    collection_name: String,
    filter: BsonDocument,
    sort: Option<BsonDocument>,
    projection: Option<BsonDocument>,
    skip: Option<u64>,
    limit: Option<i64>,
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            filter: BsonDocument::new(),
            sort: None,
            projection: None,
            skip: None,
            limit: None,
        }
    }

    /// Set the filter document
    pub fn filter(mut self, filter: BsonDocument) -> Self {
        self.filter = filter;
        self
    }

    /// Set the sort order
    pub fn sort(mut self, sort: BsonDocument) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Restrict the returned fields
    pub fn projection(mut self, projection: BsonDocument) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Set the number of documents to skip
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of documents to return
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Get the collection name
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Get the filter document
    pub fn get_filter(&self) -> &BsonDocument {
        &self.filter
    }

    /// Get the sort document
    pub fn get_sort(&self) -> Option<&BsonDocument> {
        self.sort.as_ref()
    }

    /// Get the projection document
    pub fn get_projection(&self) -> Option<&BsonDocument> {
        self.projection.as_ref()
    }

    /// Get the skip value
    pub fn get_skip(&self) -> Option<u64> {
        self.skip
    }

    /// Get the limit value
    pub fn get_limit(&self) -> Option<i64> {
        self.limit
    }

    fn find_options(&self) -> FindOptions {
        FindOptions::builder()
            .sort(self.sort.clone())
            .projection(self.projection.clone())
            .skip(self.skip)
            .limit(self.limit)
            .build()
    }

    /// Execute the query and return all matching documents
    pub async fn to_list(self, db: &Database) -> Result<Vec<BsonDocument>> {
        validate_query(&self.filter)?;

        let collection: Collection<BsonDocument> = db.collection(&self.collection_name);
        let options = self.find_options();

        let mut cursor = collection.find(self.filter).with_options(options).await?;

        let mut results = Vec::new();
        while cursor.advance().await? {
            results.push(cursor.deserialize_current()?);
        }

        debug!(collection = %self.collection_name, count = results.len(), "query returned");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_query_builder_new() {
        let qb = QueryBuilder::new("users");
        assert_eq!(qb.collection_name(), "users");
        assert!(qb.get_filter().is_empty());
        assert!(qb.get_sort().is_none());
        assert!(qb.get_projection().is_none());
        assert!(qb.get_skip().is_none());
        assert!(qb.get_limit().is_none());
    }

    #[test]
    fn test_query_builder_chaining() {
        let filter = doc! { "username": "smith" };
        let sort = doc! { "username": 1 };
        let projection = doc! { "_id": 0, "username": 1 };

        let qb = QueryBuilder::new("users")
            .filter(filter.clone())
            .sort(sort.clone())
            .projection(projection.clone())
            .skip(5)
            .limit(10);

        assert_eq!(qb.get_filter(), &filter);
        assert_eq!(qb.get_sort(), Some(&sort));
        assert_eq!(qb.get_projection(), Some(&projection));
        assert_eq!(qb.get_skip(), Some(5));
        assert_eq!(qb.get_limit(), Some(10));
    }

    #[test]
    fn test_find_options_carry_builder_state() {
        let options = QueryBuilder::new("users")
            .sort(doc! { "username": -1 })
            .limit(3)
            .find_options();
        assert_eq!(options.sort, Some(doc! { "username": -1 }));
        assert_eq!(options.limit, Some(3));
        assert_eq!(options.skip, None);
        assert_eq!(options.projection, None);
    }
}
