//! Named bind parameters: scalar values and `:name` -> positional rewriting.

use crate::db::dialect::Dialect;
use crate::error::DbError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// A scalar value bound to a placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl BindValue {
    /// Loosely-typed conversion: scalars map directly; arrays and objects
    /// bind as their JSON text.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::Int(i)
                } else {
                    BindValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => BindValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::Text(v.to_string()),
        }
    }
}

/// Bind-map keys may carry the leading `:` or not; both address the same
/// placeholder.
pub fn normalize_key(key: &str) -> &str {
    key.strip_prefix(':').unwrap_or(key)
}

fn lookup<'a>(bind: &'a HashMap<String, Value>, name: &str) -> Option<&'a Value> {
    bind.iter()
        .find(|(k, _)| normalize_key(k) == name)
        .map(|(_, v)| v)
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").unwrap())
}

/// Rewrite `:name` placeholders in `sql` to the dialect's positional form,
/// returning the rewritten text and the values in placeholder order.
/// `::` type casts are left alone. A placeholder with no entry in `bind` is
/// an explicit failure; bind entries the statement never references are
/// ignored.
pub fn expand(
    sql: &str,
    bind: &HashMap<String, Value>,
    dialect: Dialect,
) -> Result<(String, Vec<BindValue>), DbError> {
    let re = placeholder_regex();
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut values: Vec<BindValue> = Vec::new();
    let mut numbered: HashMap<String, usize> = HashMap::new();
    let mut last = 0;

    for m in re.find_iter(sql) {
        // A ':' directly before the match is a cast (col::text), not a placeholder.
        if m.start() > 0 && bytes[m.start() - 1] == b':' {
            continue;
        }
        let name = &m.as_str()[1..];
        let value = lookup(bind, name).ok_or_else(|| DbError::MissingBind(name.to_string()))?;

        out.push_str(&sql[last..m.start()]);
        if dialect.supports_numbered_placeholders() {
            let n = match numbered.get(name) {
                Some(n) => *n,
                None => {
                    values.push(BindValue::from_json(value));
                    let n = values.len();
                    numbered.insert(name.to_string(), n);
                    n
                }
            };
            out.push_str(&dialect.placeholder(n));
        } else {
            values.push(BindValue::from_json(value));
            out.push_str(&dialect.placeholder(values.len()));
        }
        last = m.end();
    }
    out.push_str(&sql[last..]);
    Ok((out, values))
}
