//! CRUD layer integration tests against an in-memory sqlite database.
//!
//! The pool is capped at one connection: every pooled connection to
//! `sqlite::memory:` would otherwise open its own empty database.

use mvc_kit::db::{Db, Dialect, QueryOutcome, Selected};
use serde_json::{json, Value};
use sqlx::any::AnyPoolOptions;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn map(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn no_bind() -> HashMap<String, Value> {
    HashMap::new()
}

async fn db() -> Db {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let db = Db::from_pool(pool, Dialect::Sqlite);
    db.run(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fname TEXT,
            lname TEXT,
            age INTEGER
        )",
        &no_bind(),
        false,
    )
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn columns_come_back_in_table_order() {
    let db = db().await;
    let columns = db.columns("users").await.unwrap();
    assert_eq!(columns, vec!["id", "fname", "lname", "age"]);
}

#[tokio::test]
async fn filter_fields_ignores_map_key_order() {
    let db = db().await;
    let fields = db
        .filter_fields(
            "users",
            &map(&[
                ("age", json!(30)),
                ("fname", json!("John")),
                ("extra_unknown_field", json!("x")),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(fields, vec!["fname", "age"]);
}

#[tokio::test]
async fn unknown_table_is_an_explicit_failure() {
    let db = db().await;
    let err = db.columns("ghost").await.unwrap_err();
    assert!(matches!(err, mvc_kit::DbError::UnknownTable(t) if t == "ghost"));
}

#[tokio::test]
async fn insert_drops_unknown_fields_silently() {
    let db = db().await;
    let id = db
        .insert(
            "users",
            &map(&[
                ("fname", json!("John")),
                ("extra_unknown_field", json!("x")),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(id, 1);

    let selected = db
        .select("users", "id = :id", &map(&[(":id", json!(id))]), "*")
        .await
        .unwrap();
    let Selected::One(record) = selected else {
        panic!("expected a single record");
    };
    assert_eq!(record.get("fname"), Some(&json!("John")));
    assert_eq!(record.get("lname"), Some(&Value::Null));
    assert!(!record.contains_key("extra_unknown_field"));
}

#[tokio::test]
async fn insert_with_no_valid_columns_fails_early() {
    let db = db().await;
    let err = db
        .insert("users", &map(&[("nope", json!(1))]))
        .await
        .unwrap_err();
    assert!(matches!(err, mvc_kit::DbError::NoColumns { operation: "insert", .. }));
}

#[tokio::test]
async fn insert_then_select_returns_the_filtered_input() {
    let db = db().await;
    let id = db
        .insert(
            "users",
            &map(&[
                ("fname", json!("Jane")),
                ("lname", json!("Doe")),
                ("age", json!(24)),
            ]),
        )
        .await
        .unwrap();
    let selected = db
        .select("users", "id = :id", &map(&[(":id", json!(id))]), "*")
        .await
        .unwrap();
    let Selected::One(record) = selected else {
        panic!("expected a single record");
    };
    assert_eq!(record.get("fname"), Some(&json!("Jane")));
    assert_eq!(record.get("lname"), Some(&json!("Doe")));
    assert_eq!(record.get("age"), Some(&json!(24)));
}

#[tokio::test]
async fn select_shape_depends_on_row_count() {
    let db = db().await;
    // Zero rows: a sequence, not a record.
    let selected = db.select("users", "", &no_bind(), "*").await.unwrap();
    assert_eq!(selected, Selected::Many(vec![]));

    db.insert("users", &map(&[("fname", json!("John"))])).await.unwrap();
    let selected = db.select("users", "", &no_bind(), "*").await.unwrap();
    assert!(matches!(selected, Selected::One(_)));

    db.insert("users", &map(&[("fname", json!("Jane"))])).await.unwrap();
    let selected = db.select("users", "", &no_bind(), "*").await.unwrap();
    match selected {
        Selected::Many(rows) => assert_eq!(rows.len(), 2),
        other => panic!("expected two rows, got {:?}", other),
    }
}

#[tokio::test]
async fn select_restricts_fields() {
    let db = db().await;
    db.insert(
        "users",
        &map(&[("fname", json!("John")), ("lname", json!("Smith"))]),
    )
    .await
    .unwrap();
    let selected = db.select("users", "", &no_bind(), "fname").await.unwrap();
    let Selected::One(record) = selected else {
        panic!("expected a single record");
    };
    assert_eq!(record.len(), 1);
    assert_eq!(record.get("fname"), Some(&json!("John")));
}

#[tokio::test]
async fn select_decodes_html_entities() {
    let db = db().await;
    db.insert("users", &map(&[("fname", json!("Tom &amp; Jerry"))]))
        .await
        .unwrap();
    let selected = db.select("users", "", &no_bind(), "*").await.unwrap();
    let Selected::One(record) = selected else {
        panic!("expected a single record");
    };
    assert_eq!(record.get("fname"), Some(&json!("Tom & Jerry")));

    // The escape hatch leaves entities alone when asked to.
    let outcome = db
        .run("SELECT fname FROM users", &no_bind(), false)
        .await
        .unwrap();
    let QueryOutcome::Rows(rows) = outcome else {
        panic!("expected rows");
    };
    assert_eq!(rows[0].get("fname"), Some(&json!("Tom &amp; Jerry")));
}

#[tokio::test]
async fn update_merges_caller_binds_with_generated_ones() {
    let db = db().await;
    db.insert(
        "users",
        &map(&[("fname", json!("Jane")), ("age", json!(23))]),
    )
    .await
    .unwrap();
    let affected = db
        .update(
            "users",
            &map(&[("age", json!(24))]),
            "fname = :fname",
            &map(&[(":fname", json!("Jane"))]),
        )
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let selected = db
        .select("users", "fname = :fname", &map(&[(":fname", json!("Jane"))]), "*")
        .await
        .unwrap();
    let Selected::One(record) = selected else {
        panic!("expected a single record");
    };
    assert_eq!(record.get("age"), Some(&json!(24)));
}

#[tokio::test]
async fn update_rejects_caller_bind_colliding_with_update_prefix() {
    let db = db().await;
    db.insert("users", &map(&[("age", json!(23))])).await.unwrap();
    let err = db
        .update(
            "users",
            &map(&[("age", json!(24))]),
            "age = :update_age",
            &map(&[(":update_age", json!(23))]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, mvc_kit::DbError::BindCollision(_)));
}

#[tokio::test]
async fn delete_reports_affected_rows() {
    let db = db().await;
    db.insert("users", &map(&[("age", json!(20))])).await.unwrap();
    db.insert("users", &map(&[("age", json!(35))])).await.unwrap();
    db.insert("users", &map(&[("age", json!(40))])).await.unwrap();

    let affected = db
        .delete("users", "age < :limit", &map(&[(":limit", json!(30))]))
        .await
        .unwrap();
    assert_eq!(affected, 1);

    // Empty where clause wipes the table; the caller asked for it.
    let affected = db.delete("users", "", &no_bind()).await.unwrap();
    assert_eq!(affected, 2);
}

#[tokio::test]
async fn run_shapes_follow_the_statement_verb() {
    let db = db().await;
    let outcome = db
        .run(
            "INSERT INTO users (fname) VALUES (:fname)",
            &map(&[(":fname", json!("John"))]),
            true,
        )
        .await
        .unwrap();
    assert_eq!(outcome, QueryOutcome::InsertId(1));

    let outcome = db
        .run("UPDATE users SET age = :age", &map(&[(":age", json!(30))]), true)
        .await
        .unwrap();
    assert_eq!(outcome, QueryOutcome::Affected(1));

    let outcome = db
        .run("PRAGMA table_info('users')", &no_bind(), false)
        .await
        .unwrap();
    let QueryOutcome::Rows(rows) = outcome else {
        panic!("expected rows");
    };
    assert_eq!(rows.len(), 4);

    let outcome = db
        .run("DELETE FROM users", &no_bind(), true)
        .await
        .unwrap();
    assert_eq!(outcome, QueryOutcome::Affected(1));
}

#[tokio::test]
async fn missing_bind_parameter_is_an_explicit_failure() {
    let db = db().await;
    let err = db
        .select("users", "id = :id", &no_bind(), "*")
        .await
        .unwrap_err();
    assert!(matches!(err, mvc_kit::DbError::MissingBind(name) if name == "id"));
}

#[tokio::test]
async fn invalid_table_identifier_is_rejected() {
    let db = db().await;
    let err = db
        .select("users; DROP TABLE users", "", &no_bind(), "*")
        .await
        .unwrap_err();
    assert!(matches!(err, mvc_kit::DbError::InvalidIdentifier(_)));
}

#[tokio::test]
async fn engine_failures_reach_the_error_hook() {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let db = Db::from_pool(pool, Dialect::Sqlite).with_error_hook(move |diag| {
        sink.lock()
            .unwrap()
            .push((diag.sql.clone(), diag.operation.to_string()));
    });

    let err = db
        .run("SELECT * FROM missing_table", &no_bind(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, mvc_kit::DbError::Query { .. }));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "SELECT * FROM missing_table");
    assert_eq!(seen[0].1, "run");
}
