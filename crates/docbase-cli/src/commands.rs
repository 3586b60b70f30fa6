//! Command implementations
//!
//! Each command writes its results to `out` so the binary can hand it stdout
//! and tests can hand it a buffer.

use anyhow::{bail, Context, Result};
use bson::{doc, Document as BsonDocument};
use clap::ValueEnum;
use docbase_mongodb::{
    parse_document, write_documents, CollectionRef, Connection, Document, OutputFormat,
    QueryBuilder, User, ValidatedCollectionName,
};
use std::io::Write;
use tracing::info;

/// The canned sequences from the original tutorial
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Script {
    /// List collections, then print every user
    Connect,
    /// Insert the users smith and jones
    InsertUsers,
    /// Delete smith, then every remaining user
    DeleteUsers,
}

/// Parse an optional `--filter`, defaulting to the empty filter
pub fn parse_filter(filter: Option<&str>) -> Result<BsonDocument> {
    match filter {
        Some(text) => parse_document(text).context("Invalid --filter"),
        None => Ok(doc! {}),
    }
}

pub async fn list_collections<W: Write>(conn: &Connection, out: &mut W) -> Result<()> {
    for name in conn.list_collection_names().await? {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

pub async fn list_databases<W: Write>(conn: &Connection, out: &mut W) -> Result<()> {
    for name in conn.list_database_names().await? {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

/// Options for `list`
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl ListOptions {
    fn into_query(self, collection: &str) -> Result<QueryBuilder> {
        let mut query = QueryBuilder::new(collection).filter(parse_filter(self.filter.as_deref())?);
        if let Some(sort) = self.sort {
            query = query.sort(parse_document(&sort).context("Invalid --sort")?);
        }
        if let Some(skip) = self.skip {
            query = query.skip(skip);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        Ok(query)
    }
}

pub async fn list_documents<W: Write>(
    conn: &Connection,
    collection: &ValidatedCollectionName,
    options: ListOptions,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let docs = options
        .into_query(collection.as_str())?
        .to_list(conn.database())
        .await?;
    write_documents(out, &docs, format)?;
    Ok(())
}

/// Insert the given JSON documents; one goes through `insert_one` unless `many` is set
pub async fn insert_documents<W: Write>(
    collection: &CollectionRef,
    documents: &[String],
    many: bool,
    out: &mut W,
) -> Result<()> {
    let mut parsed = documents
        .iter()
        .map(|text| parse_document(text).with_context(|| format!("Invalid document: {}", text)))
        .collect::<Result<Vec<_>>>()?;

    let ids = match parsed.len() {
        0 => bail!("No documents given"),
        1 if !many => vec![collection.insert_one(parsed.remove(0)).await?],
        _ => collection.insert_many(parsed).await?,
    };

    info!(collection = %collection.name(), count = ids.len(), "documents inserted");
    writeln!(out, "Inserted {} document(s)", ids.len())?;
    for id in ids {
        writeln!(out, "{}", id)?;
    }
    Ok(())
}

/// `insert-user` writes through the `User` model, which is bound to `users`
pub fn check_user_collection(collection: &ValidatedCollectionName) -> Result<()> {
    if collection.as_str() != User::collection_name() {
        bail!(
            "insert-user always writes to '{}', not '{}'; use `insert` for other collections",
            User::collection_name(),
            collection.as_str()
        );
    }
    Ok(())
}

/// Insert one `User` per username
pub async fn insert_users<W: Write>(
    conn: &Connection,
    collection: &ValidatedCollectionName,
    usernames: &[String],
    out: &mut W,
) -> Result<()> {
    check_user_collection(collection)?;
    let mut users: Vec<User> = usernames.iter().map(User::new).collect();
    let ids = User::insert_many(&mut users, conn.database()).await?;
    for (user, id) in users.iter().zip(ids) {
        writeln!(out, "{} {}", id, user.username)?;
    }
    Ok(())
}

/// What `delete` should remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// First match of the filter
    One(String),
    /// Every match of the filter
    Many(String),
    /// The whole collection
    All,
}

pub async fn delete_documents<W: Write>(
    collection: &CollectionRef,
    target: DeleteTarget,
    out: &mut W,
) -> Result<()> {
    let deleted = match target {
        DeleteTarget::One(filter) => {
            collection.delete_one(parse_filter(Some(filter.as_str()))?).await?
        }
        DeleteTarget::Many(filter) => {
            collection.delete_many(parse_filter(Some(filter.as_str()))?).await?
        }
        DeleteTarget::All => collection.delete_all().await?,
    };
    info!(collection = %collection.name(), deleted, "documents deleted");
    writeln!(out, "Deleted {} document(s)", deleted)?;
    Ok(())
}

pub async fn count_documents<W: Write>(
    collection: &CollectionRef,
    filter: Option<&str>,
    out: &mut W,
) -> Result<()> {
    let count = collection.count(parse_filter(filter)?).await?;
    writeln!(out, "{}", count)?;
    Ok(())
}

pub async fn ping<W: Write>(conn: &Connection, out: &mut W) -> Result<()> {
    conn.ping().await?;
    writeln!(out, "ok")?;
    Ok(())
}

/// Run one of the tutorial sequences against the `users` collection
pub async fn run_script<W: Write>(
    conn: &Connection,
    script: Script,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let db = conn.database();
    match script {
        Script::Connect => {
            writeln!(out, "Collections:")?;
            list_collections(conn, out).await?;

            let name = ValidatedCollectionName::new(User::collection_name())?;
            let users = CollectionRef::new(conn, &name);
            writeln!(out, "Users:")?;
            let docs = users.find_all().await?;
            write_documents(out, &docs, format)?;
        }
        Script::InsertUsers => {
            for username in ["smith", "jones"] {
                let id = User::new(username).insert_one(db).await?;
                info!(%id, username, "user inserted");
            }
        }
        Script::DeleteUsers => {
            let removed = User::delete_one(db, User::filter_by_username("smith")).await?;
            info!(removed, "delete smith");
            let deleted = User::delete_all(db).await?;
            info!(deleted, "users collection emptied");
        }
    }
    Ok(())
}
