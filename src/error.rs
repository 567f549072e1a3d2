//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("unsupported database driver: {0}")]
    UnsupportedDriver(String),
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("no valid columns for {operation} on {table}")]
    NoColumns { table: String, operation: &'static str },
    #[error("missing bind parameter: :{0}")]
    MissingBind(String),
    #[error("bind parameter :{0} collides with a generated :update_* parameter")]
    BindCollision(String),
    #[error("connect: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("query failed: {message}")]
    Query {
        message: String,
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("no controller registered for '{0}'")]
    ControllerNotFound(String),
    #[error("controller '{controller}' has no method '{method}'")]
    MethodNotFound { controller: String, method: String },
    #[error("invalid route pattern '{pattern}': {message}")]
    RoutePattern { pattern: String, message: String },
    #[error("config load: {0}")]
    Config(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Db(e) => match e {
                DbError::MissingBind(_)
                | DbError::BindCollision(_)
                | DbError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, "bad_request"),
                DbError::UnknownTable(_) => (StatusCode::NOT_FOUND, "not_found"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
            AppError::ControllerNotFound(_)
            | AppError::MethodNotFound { .. }
            | AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::RoutePattern { .. } | AppError::Config(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error")
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
