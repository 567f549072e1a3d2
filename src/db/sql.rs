//! Builds parameterized SELECT, INSERT, UPDATE, DELETE with named placeholders.

use crate::error::DbError;
use serde_json::Value;
use std::collections::HashMap;

/// SQL text plus the named bind set it expects.
#[derive(Clone, Debug)]
pub struct Statement {
    pub sql: String,
    pub bind: HashMap<String, Value>,
}

/// Table identifiers are interpolated into statement text and must be plain
/// identifiers; anything else is rejected before any SQL is built.
pub fn check_ident(name: &str) -> Result<(), DbError> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

/// `SELECT {fields} FROM {table} [WHERE {where_clause}]`.
pub fn select_stmt(
    table: &str,
    where_clause: &str,
    bind: &HashMap<String, Value>,
    fields: &str,
) -> Statement {
    let mut sql = format!("SELECT {} FROM {}", fields, table);
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(where_clause);
    }
    Statement {
        sql,
        bind: bind.clone(),
    }
}

/// INSERT naming only the already-filtered `fields`, each bound as `:field`.
pub fn insert_stmt(table: &str, fields: &[String], info: &HashMap<String, Value>) -> Statement {
    let columns = fields.join(", ");
    let placeholders = fields
        .iter()
        .map(|f| format!(":{}", f))
        .collect::<Vec<_>>()
        .join(", ");
    let bind = fields
        .iter()
        .map(|f| {
            (
                format!(":{}", f),
                info.get(f).cloned().unwrap_or(Value::Null),
            )
        })
        .collect();
    Statement {
        sql: format!("INSERT INTO {} ({}) VALUES ({})", table, columns, placeholders),
        bind,
    }
}

/// UPDATE with `SET field = :update_field` per filtered field, merging the
/// caller's where-clause binds. A caller bind that collides with a generated
/// `:update_*` key is rejected rather than silently overwritten.
pub fn update_stmt(
    table: &str,
    fields: &[String],
    info: &HashMap<String, Value>,
    where_clause: &str,
    bind: &HashMap<String, Value>,
) -> Result<Statement, DbError> {
    use crate::db::bind::normalize_key;

    let assignments = fields
        .iter()
        .map(|f| format!("{} = :update_{}", f, f))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!("UPDATE {} SET {}", table, assignments);
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(where_clause);
    }

    let mut merged: HashMap<String, Value> = bind.clone();
    for f in fields {
        let generated = format!("update_{}", f);
        if bind.keys().any(|k| normalize_key(k) == generated) {
            return Err(DbError::BindCollision(generated));
        }
        merged.insert(
            format!(":{}", generated),
            info.get(f).cloned().unwrap_or(Value::Null),
        );
    }
    Ok(Statement { sql, bind: merged })
}

/// `DELETE FROM {table} [WHERE {where_clause}]`. An empty where clause
/// deletes every row; callers bear that responsibility.
pub fn delete_stmt(table: &str, where_clause: &str, bind: &HashMap<String, Value>) -> Statement {
    let mut sql = format!("DELETE FROM {}", table);
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(where_clause);
    }
    Statement {
        sql,
        bind: bind.clone(),
    }
}
