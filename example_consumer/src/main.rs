//! Example consumer: a separate Rust project that uses mvc-kit as a dependency.
//!
//! Registers two demo controllers (`Home` and the namespaced
//! `Admin/TopSales`), compiles the route table, and serves the front
//! controller. Try:
//!
//!   GET /                      -> Home::index
//!   GET /user/smith/jones      -> remapped, Home::user("smith", "jones")
//!   GET /admin/top-sales/list  -> Admin/TopSales::list

use async_trait::async_trait;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mvc_kit::{
    database_url, AppError, AppState, Controller, ControllerRegistry, Db, DbError,
    FrameworkConfig, RouteTable,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

const DEFAULT_CONFIG: &str = r#"{
    "default_controller": "Home",
    "default_method": "index",
    "uri_source": "request_path",
    "routes": [
        {"pattern": "user/([a-z]+)/([a-z]+)", "replacement": "home/user/$1/$2"},
        {"pattern": "product/:num", "replacement": "admin/top-sales/list/$1"}
    ],
    "database": {"driver": "sqlite", "database": "example.db?mode=rwc"}
}"#;

struct Home;

#[async_trait]
impl Controller for Home {
    fn methods(&self) -> &[&'static str] {
        &["index", "user"]
    }

    async fn call(&self, method: &str, params: &[String]) -> Result<Response, AppError> {
        match method {
            "index" => Ok(Json(json!({ "message": "welcome", "params": params })).into_response()),
            "user" => Ok(Json(json!({ "user": params })).into_response()),
            other => Err(AppError::MethodNotFound {
                controller: "Home".into(),
                method: other.into(),
            }),
        }
    }
}

struct TopSales {
    db: Arc<Db>,
}

#[async_trait]
impl Controller for TopSales {
    fn methods(&self) -> &[&'static str] {
        &["index", "list"]
    }

    async fn call(&self, method: &str, params: &[String]) -> Result<Response, AppError> {
        match method {
            "index" | "list" => {
                let (where_clause, bind) = match params.first() {
                    Some(id) => (
                        "id = :id",
                        HashMap::from([(":id".to_string(), json!(id))]),
                    ),
                    None => ("", HashMap::new()),
                };
                let rows = self
                    .db
                    .select("sales", where_clause, &bind, "*")
                    .await?
                    .into_rows();
                Ok(Json(json!({ "data": rows })).into_response())
            }
            other => Err(AppError::MethodNotFound {
                controller: "Admin/TopSales".into(),
                method: other.into(),
            }),
        }
    }
}

async fn seed(db: &Db) -> Result<(), DbError> {
    db.run(
        "CREATE TABLE IF NOT EXISTS sales (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            product TEXT,
            amount INTEGER
        )",
        &HashMap::new(),
        false,
    )
    .await?;

    let existing = db.select("sales", "", &HashMap::new(), "*").await?;
    if existing.into_rows().is_empty() {
        for (product, amount) in [("widget", 120), ("gadget", 80)] {
            let row: HashMap<String, Value> = HashMap::from([
                ("product".to_string(), json!(product)),
                ("amount".to_string(), json!(amount)),
            ]);
            db.insert("sales", &row).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mvc_kit=debug,example_consumer=info")),
        )
        .init();

    let config = match std::env::var("MVC_CONFIG") {
        Ok(path) => FrameworkConfig::load(&path)?,
        Err(_) => FrameworkConfig::from_json(DEFAULT_CONFIG)?,
    };

    let db = Arc::new(Db::connect(&database_url(&config)).await?);
    seed(&db).await?;

    let mut registry = ControllerRegistry::new();
    registry.register("Home", Arc::new(Home));
    registry.register("Admin/TopSales", Arc::new(TopSales { db: db.clone() }));

    let routes = RouteTable::compile(&config.routes)?;
    let state = AppState {
        registry: Arc::new(registry),
        routes: Arc::new(routes),
        config: Arc::new(config),
    };

    let app = mvc_kit::front_router(state).layer(TraceLayer::new_for_http());
    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
