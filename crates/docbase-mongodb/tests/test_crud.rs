//! Integration tests for CRUD against a live server.
//!
//! These tests require a MongoDB server to be running.
//! Set MONGODB_URI (default mongodb://localhost:27017) and run with --ignored.

use bson::{doc, oid::ObjectId};
use docbase_mongodb::{
    CollectionRef, Connection, Document, QueryBuilder, User, ValidatedCollectionName,
};

fn mongodb_uri() -> String {
    std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
}

/// Each test gets its own throwaway database
async fn scratch_connection() -> Connection {
    let name = format!("docbase_test_{}", ObjectId::new().to_hex());
    Connection::new(&mongodb_uri(), &name).await.unwrap()
}

fn users(conn: &Connection) -> CollectionRef {
    CollectionRef::new(conn, &ValidatedCollectionName::new("users").unwrap())
}

async fn cleanup(conn: Connection) {
    conn.database().drop().await.unwrap();
    conn.close().await;
}

#[tokio::test]
#[ignore] // Only run with --ignored flag when database is available
async fn test_ping() {
    let conn = scratch_connection().await;
    conn.ping().await.unwrap();
    cleanup(conn).await;
}

#[tokio::test]
#[ignore]
async fn test_inserted_username_is_retrievable_by_filter() {
    let conn = scratch_connection().await;
    let users = users(&conn);

    let id = users.insert_one(doc! { "username": "smith" }).await.unwrap();
    assert!(id.as_object_id().is_some());

    let found = users.find(doc! { "username": "smith" }).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get_str("username").unwrap(), "smith");
    assert_eq!(found[0].get("_id"), Some(&id));

    cleanup(conn).await;
}

#[tokio::test]
#[ignore]
async fn test_insert_many_returns_ids_in_order() {
    let conn = scratch_connection().await;
    let users = users(&conn);

    let ids = users
        .insert_many(vec![
            doc! { "username": "smith" },
            doc! { "username": "jones" },
        ])
        .await
        .unwrap();
    assert_eq!(ids.len(), 2);

    let jones = users.find(doc! { "username": "jones" }).await.unwrap();
    assert_eq!(jones[0].get("_id"), Some(&ids[1]));
    assert_eq!(users.count(doc! {}).await.unwrap(), 2);

    cleanup(conn).await;
}

#[tokio::test]
#[ignore]
async fn test_delete_one_removes_exactly_one_match() {
    let conn = scratch_connection().await;
    let users = users(&conn);

    users
        .insert_many(vec![
            doc! { "username": "smith" },
            doc! { "username": "smith" },
            doc! { "username": "jones" },
        ])
        .await
        .unwrap();

    assert_eq!(users.delete_one(doc! { "username": "smith" }).await.unwrap(), 1);
    assert_eq!(users.count(doc! { "username": "smith" }).await.unwrap(), 1);
    assert_eq!(users.delete_one(doc! { "username": "brown" }).await.unwrap(), 0);

    cleanup(conn).await;
}

#[tokio::test]
#[ignore]
async fn test_delete_all_empties_collection() {
    let conn = scratch_connection().await;
    let users = users(&conn);

    users
        .insert_many(vec![doc! { "username": "smith" }, doc! { "username": "jones" }])
        .await
        .unwrap();

    assert_eq!(users.delete_all().await.unwrap(), 2);
    assert!(users.find_all().await.unwrap().is_empty());

    cleanup(conn).await;
}

#[tokio::test]
#[ignore]
async fn test_list_collections_includes_inserted_collection() {
    let conn = scratch_connection().await;
    users(&conn).insert_one(doc! { "username": "smith" }).await.unwrap();

    let names = conn.list_collection_names().await.unwrap();
    assert!(names.contains(&"users".to_string()));

    cleanup(conn).await;
}

#[tokio::test]
#[ignore]
async fn test_typed_user_roundtrip() {
    let conn = scratch_connection().await;
    let db = conn.database();

    let mut smith = User::new("smith");
    let id = smith.insert_one(db).await.unwrap();
    assert_eq!(smith.id, Some(id));

    let mut batch = vec![User::new("jones"), User::new("brown")];
    let ids = User::insert_many(&mut batch, db).await.unwrap();
    assert_eq!(ids.len(), 2);
    assert!(batch.iter().all(|u| u.id.is_some()));

    let found = User::find_one(db, User::filter_by_username("smith"))
        .await
        .unwrap()
        .expect("smith should exist");
    assert_eq!(found, smith);

    assert!(User::delete_one(db, User::filter_by_username("smith")).await.unwrap());
    assert_eq!(User::count(db, doc! {}).await.unwrap(), 2);
    assert_eq!(User::delete_all(db).await.unwrap(), 2);
    assert!(User::find_all(db).await.unwrap().is_empty());

    cleanup(conn).await;
}

#[tokio::test]
#[ignore]
async fn test_query_builder_sort_and_limit() {
    let conn = scratch_connection().await;
    users(&conn)
        .insert_many(vec![
            doc! { "username": "smith" },
            doc! { "username": "jones" },
            doc! { "username": "brown" },
        ])
        .await
        .unwrap();

    let docs = QueryBuilder::new("users")
        .sort(doc! { "username": 1 })
        .projection(doc! { "_id": 0 })
        .limit(2)
        .to_list(conn.database())
        .await
        .unwrap();

    assert_eq!(docs, vec![doc! { "username": "brown" }, doc! { "username": "jones" }]);

    cleanup(conn).await;
}
