//! Minimal server: the router/dispatcher standing alone, no database.
//!
//! Registers one controller and serves the front controller with a small
//! route table. Run with `cargo run --example server`.

use async_trait::async_trait;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mvc_kit::{
    front_router, AppError, AppState, Controller, ControllerRegistry, FrameworkConfig, RouteTable,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

struct Home;

#[async_trait]
impl Controller for Home {
    fn methods(&self) -> &[&'static str] {
        &["index", "user"]
    }

    async fn call(&self, method: &str, params: &[String]) -> Result<Response, AppError> {
        match method {
            "index" => Ok(Json(json!({ "message": "welcome" })).into_response()),
            "user" => Ok(Json(json!({ "user": params })).into_response()),
            other => Err(AppError::MethodNotFound {
                controller: "Home".into(),
                method: other.into(),
            }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mvc_kit=debug")),
        )
        .init();

    let config = FrameworkConfig::from_json(
        r#"{
            "routes": [
                {"pattern": "user/([a-z]+)/([a-z]+)", "replacement": "home/user/$1/$2"}
            ],
            "database": {"driver": "sqlite", "database": ":memory:"}
        }"#,
    )?;

    let mut registry = ControllerRegistry::new();
    registry.register("Home", Arc::new(Home));

    let routes = RouteTable::compile(&config.routes)?;
    let state = AppState {
        registry: Arc::new(registry),
        routes: Arc::new(routes),
        config: Arc::new(config),
    };

    let app = front_router(state).layer(TraceLayer::new_for_http());
    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
