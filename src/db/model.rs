//! Generic CRUD execution over any supported engine, with live schema
//! introspection and automatic bind-parameter filtering.

use crate::db::bind::{expand, BindValue};
use crate::db::dialect::Dialect;
use crate::db::sql::{check_ident, delete_stmt, insert_stmt, select_stmt, update_stmt};
use crate::error::DbError;
use serde_json::Value;
use sqlx::any::{AnyPoolOptions, AnyQueryResult, AnyRow};
use sqlx::AnyPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One result row: column name to string/number/null.
pub type Record = serde_json::Map<String, Value>;

/// Result shape of [`Db::select`]: exactly one matching row collapses to the
/// record itself, zero or several come back as a sequence. Callers must
/// match both arms.
#[derive(Clone, Debug, PartialEq)]
pub enum Selected {
    One(Record),
    Many(Vec<Record>),
}

impl Selected {
    /// Flatten either shape into a sequence.
    pub fn into_rows(self) -> Vec<Record> {
        match self {
            Selected::One(record) => vec![record],
            Selected::Many(records) => records,
        }
    }
}

/// Outcome of [`Db::run`], shaped by the statement's leading verb.
#[derive(Debug, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<Record>),
    Affected(u64),
    InsertId(i64),
}

/// Context recorded for every engine-level failure and handed to the
/// diagnostic hook.
#[derive(Clone, Debug)]
pub struct SqlDiagnostic {
    pub message: String,
    pub sql: String,
    pub bind: HashMap<String, Value>,
    /// Entry point that issued the statement ("select", "update", "run", ...).
    pub operation: &'static str,
}

pub type ErrorHook = Arc<dyn Fn(&SqlDiagnostic) + Send + Sync>;

/// Table-agnostic data access over a single connection pool. One `Db` per
/// logical unit of work; column introspection is memoized for its lifetime.
pub struct Db {
    pool: AnyPool,
    dialect: Dialect,
    on_error: Option<ErrorHook>,
    columns_cache: RwLock<HashMap<String, Vec<String>>>,
}

impl Db {
    /// Connect using a sqlx URL (`sqlite://...`, `mysql://...`,
    /// `postgres://...`); the dialect is derived from the scheme.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        sqlx::any::install_default_drivers();
        let dialect = Dialect::from_url(url)?;
        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(DbError::Connect)?;
        Ok(Self::from_pool(pool, dialect))
    }

    /// Wrap an existing pool (used by tests and embedders that manage their
    /// own pool options).
    pub fn from_pool(pool: AnyPool, dialect: Dialect) -> Self {
        Db {
            pool,
            dialect,
            on_error: None,
            columns_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Install the diagnostic callback invoked on every engine-level failure.
    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&SqlDiagnostic) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Column names of `table` in table order, from the live schema.
    /// Memoized per table; an empty introspection result means the table
    /// does not exist.
    pub async fn columns(&self, table: &str) -> Result<Vec<String>, DbError> {
        check_ident(table)?;
        if let Some(columns) = self.columns_cache.read().await.get(table) {
            return Ok(columns.clone());
        }

        let (sql, key) = self.dialect.columns_query(table);
        let mut bind = HashMap::new();
        if self.dialect.columns_query_binds_table() {
            bind.insert(":table".to_string(), Value::String(table.to_string()));
        }
        let rows = self.query_rows(&sql, &bind, false, "columns").await?;
        let columns: Vec<String> = rows
            .iter()
            .filter_map(|r| r.get(key).and_then(Value::as_str).map(String::from))
            .collect();
        if columns.is_empty() {
            return Err(DbError::UnknownTable(table.to_string()));
        }

        self.columns_cache
            .write()
            .await
            .insert(table.to_string(), columns.clone());
        Ok(columns)
    }

    /// Intersect the live column set with the caller's field map, preserving
    /// column order. Map keys that are not real columns are dropped silently.
    pub async fn filter_fields(
        &self,
        table: &str,
        info: &HashMap<String, Value>,
    ) -> Result<Vec<String>, DbError> {
        let columns = self.columns(table).await?;
        Ok(columns
            .into_iter()
            .filter(|c| info.contains_key(c))
            .collect())
    }

    /// `SELECT {fields} FROM {table} [WHERE {where_clause}]` with bound
    /// parameters. String values are entity-decoded. Exactly one row comes
    /// back as `Selected::One`; zero or several as `Selected::Many`.
    pub async fn select(
        &self,
        table: &str,
        where_clause: &str,
        bind: &HashMap<String, Value>,
        fields: &str,
    ) -> Result<Selected, DbError> {
        check_ident(table)?;
        let stmt = select_stmt(table, where_clause, bind, fields);
        let rows = self.query_rows(&stmt.sql, &stmt.bind, true, "select").await?;
        Ok(collapse(rows))
    }

    /// Filtered, parameterized INSERT. Returns the engine-assigned id of the
    /// new row (0 where the driver reports none, e.g. postgres).
    pub async fn insert(&self, table: &str, info: &HashMap<String, Value>) -> Result<i64, DbError> {
        let fields = self.filter_fields(table, info).await?;
        if fields.is_empty() {
            return Err(DbError::NoColumns {
                table: table.to_string(),
                operation: "insert",
            });
        }
        let stmt = insert_stmt(table, &fields, info);
        let result = self.execute(&stmt.sql, &stmt.bind, "insert").await?;
        Ok(result.last_insert_id().unwrap_or(0))
    }

    /// Filtered, parameterized UPDATE; caller binds merge with the generated
    /// `:update_*` binds. Returns rows affected.
    pub async fn update(
        &self,
        table: &str,
        info: &HashMap<String, Value>,
        where_clause: &str,
        bind: &HashMap<String, Value>,
    ) -> Result<u64, DbError> {
        let fields = self.filter_fields(table, info).await?;
        if fields.is_empty() {
            return Err(DbError::NoColumns {
                table: table.to_string(),
                operation: "update",
            });
        }
        let stmt = update_stmt(table, &fields, info, where_clause, bind)?;
        let result = self.execute(&stmt.sql, &stmt.bind, "update").await?;
        Ok(result.rows_affected())
    }

    /// Parameterized DELETE. An empty where clause deletes every row.
    /// Returns rows affected.
    pub async fn delete(
        &self,
        table: &str,
        where_clause: &str,
        bind: &HashMap<String, Value>,
    ) -> Result<u64, DbError> {
        check_ident(table)?;
        let stmt = delete_stmt(table, where_clause, bind);
        let result = self.execute(&stmt.sql, &stmt.bind, "delete").await?;
        Ok(result.rows_affected())
    }

    /// Escape hatch for free-form statements. The return shape follows the
    /// statement's leading verb: select/describe/pragma fetch rows,
    /// delete/update report affected rows, insert reports the new row id;
    /// anything else executes and reports affected rows.
    pub async fn run(
        &self,
        sql: &str,
        bind: &HashMap<String, Value>,
        entity_decode: bool,
    ) -> Result<QueryOutcome, DbError> {
        let sql = sql.trim();
        match StatementKind::classify(sql) {
            StatementKind::Query => {
                let rows = self.query_rows(sql, bind, entity_decode, "run").await?;
                Ok(QueryOutcome::Rows(rows))
            }
            StatementKind::Mutation => {
                let result = self.execute(sql, bind, "run").await?;
                Ok(QueryOutcome::Affected(result.rows_affected()))
            }
            StatementKind::Insert => {
                let result = self.execute(sql, bind, "run").await?;
                Ok(QueryOutcome::InsertId(result.last_insert_id().unwrap_or(0)))
            }
            StatementKind::Other => {
                let result = self.execute(sql, bind, "run").await?;
                Ok(QueryOutcome::Affected(result.rows_affected()))
            }
        }
    }

    async fn query_rows(
        &self,
        sql: &str,
        bind: &HashMap<String, Value>,
        entity_decode: bool,
        operation: &'static str,
    ) -> Result<Vec<Record>, DbError> {
        let (expanded, values) = expand(sql, bind, self.dialect)?;
        tracing::debug!(sql = %expanded, params = ?values, "query");
        let mut query = sqlx::query(&expanded);
        for v in &values {
            query = bind_value(query, v);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.fail(e, sql, bind, operation))?;
        let mut records: Vec<Record> = rows.iter().map(row_to_record).collect();
        if entity_decode {
            for record in &mut records {
                decode_record(record);
            }
        }
        Ok(records)
    }

    async fn execute(
        &self,
        sql: &str,
        bind: &HashMap<String, Value>,
        operation: &'static str,
    ) -> Result<AnyQueryResult, DbError> {
        let (expanded, values) = expand(sql, bind, self.dialect)?;
        tracing::debug!(sql = %expanded, params = ?values, "execute");
        let mut query = sqlx::query(&expanded);
        for v in &values {
            query = bind_value(query, v);
        }
        query
            .execute(&self.pool)
            .await
            .map_err(|e| self.fail(e, sql, bind, operation))
    }

    /// Record the failure, notify the hook, and hand back a typed error.
    fn fail(
        &self,
        source: sqlx::Error,
        sql: &str,
        bind: &HashMap<String, Value>,
        operation: &'static str,
    ) -> DbError {
        let message = source.to_string();
        tracing::error!(sql = %sql, operation = operation, error = %message, "query failed");
        if let Some(hook) = &self.on_error {
            hook(&SqlDiagnostic {
                message: message.clone(),
                sql: sql.to_string(),
                bind: bind.clone(),
                operation,
            });
        }
        DbError::Query { message, source }
    }
}

enum StatementKind {
    Query,
    Mutation,
    Insert,
    Other,
}

impl StatementKind {
    fn classify(sql: &str) -> Self {
        let verb = sql
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match verb.as_str() {
            "select" | "describe" | "pragma" => StatementKind::Query,
            "delete" | "update" => StatementKind::Mutation,
            "insert" => StatementKind::Insert,
            _ => StatementKind::Other,
        }
    }
}

fn collapse(mut rows: Vec<Record>) -> Selected {
    if rows.len() == 1 {
        Selected::One(rows.remove(0))
    } else {
        Selected::Many(rows)
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>>,
    v: &BindValue,
) -> sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>> {
    match v {
        BindValue::Null => query.bind(None::<String>),
        BindValue::Bool(b) => query.bind(*b),
        BindValue::Int(n) => query.bind(*n),
        BindValue::Float(f) => query.bind(*f),
        BindValue::Text(s) => query.bind(s.clone()),
    }
}

fn row_to_record(row: &AnyRow) -> Record {
    use sqlx::{Column, Row};
    let mut record = Record::new();
    for (i, col) in row.columns().iter().enumerate() {
        record.insert(col.name().to_string(), cell_to_value(row, i));
    }
    record
}

fn cell_to_value(row: &AnyRow, i: usize) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(i) {
        return Value::Number(n.into());
    }
    if let Ok(Some(f)) = row.try_get::<Option<f64>, _>(i) {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(i) {
        return Value::Bool(b);
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(i) {
        return Value::String(s);
    }
    Value::Null
}

/// Reverse HTML-entity escaping on every string cell of a record.
fn decode_record(record: &mut Record) {
    for (_, v) in record.iter_mut() {
        if let Value::String(s) = v {
            let decoded = decode_entities(s);
            if decoded != *s {
                *v = Value::String(decoded);
            }
        }
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
