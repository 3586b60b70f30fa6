//! MongoDB layer for docbase
//!
//! Thin wrappers over the official driver for connecting, listing collections,
//! inserting, deleting and printing documents.
//!
//! # Features
//! - Lazy connection handle with pool options and stable API pinning
//! - Untyped CRUD over any collection (`CollectionRef`)
//! - Typed models through the `Document` trait (`User`)
//! - Query builder with sort, projection, skip and limit
//! - Screening of names, filters and inserted documents
//! - JSON input parsing and terminal output formats

pub mod collection;
pub mod connection;
pub mod document;
pub mod format;
pub mod query;
pub mod validation;

pub use collection::CollectionRef;
pub use connection::{uri_from_host_port, Connection, PoolConfig, DEFAULT_HOST, DEFAULT_PORT};
pub use docbase_common::{DocbaseError, Result};
pub use document::{Document, User};
pub use format::{parse_document, render_document, write_documents, OutputFormat};
pub use query::QueryBuilder;
pub use validation::{
    validate_document, validate_query, ValidatedCollectionName, ValidatedFieldName,
};
