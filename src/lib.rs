//! mvc-kit: micro-MVC web framework library.
//!
//! Two independent components compose behind a thin axum front controller:
//! a router/dispatcher (route remapping plus registry-backed controller
//! resolution) and a generic data access layer (table-agnostic CRUD with
//! live schema introspection).

pub mod case;
pub mod config;
pub mod db;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;

pub use config::{database_url, DatabaseConfig, FrameworkConfig, RouteRule, UriSource};
pub use db::{Db, Dialect, QueryOutcome, Record, Selected, SqlDiagnostic};
pub use error::{AppError, DbError};
pub use router::{dispatch, resolve, Controller, ControllerRegistry, Resolution, RouteTable};
pub use routes::{front_router, request_path};
pub use state::AppState;
