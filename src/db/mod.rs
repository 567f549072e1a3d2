//! Generic data access layer: table-agnostic CRUD over introspected schema.

mod bind;
mod dialect;
mod model;
mod sql;

pub use bind::BindValue;
pub use dialect::Dialect;
pub use model::{Db, ErrorHook, QueryOutcome, Record, Selected, SqlDiagnostic};
pub use sql::{delete_stmt, insert_stmt, select_stmt, update_stmt, Statement};
