//! Per-driver strategy: schema introspection query and placeholder style.

use crate::error::DbError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    MySql,
    Postgres,
}

impl Dialect {
    /// Derive the dialect from a connection URL scheme. Both `sqlite://file`
    /// and the short `sqlite::memory:` form carry the scheme before the
    /// first colon.
    pub fn from_url(url: &str) -> Result<Self, DbError> {
        let scheme = url.split(':').next().unwrap_or("");
        match scheme {
            "sqlite" => Ok(Dialect::Sqlite),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(DbError::UnsupportedDriver(other.to_string())),
        }
    }

    /// Schema query returning one row per column of `table`, and the result
    /// key holding the column name. The table identifier is interpolated
    /// (PRAGMA and DESCRIBE cannot bind it); callers validate it first.
    /// Postgres binds the table name as `:table` instead.
    pub fn columns_query(&self, table: &str) -> (String, &'static str) {
        match self {
            Dialect::Sqlite => (format!("PRAGMA table_info('{}')", table), "name"),
            Dialect::MySql => (format!("DESCRIBE {}", table), "Field"),
            Dialect::Postgres => (
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_name = :table ORDER BY ordinal_position"
                    .to_string(),
                "column_name",
            ),
        }
    }

    /// Whether the columns query expects a `:table` bind parameter.
    pub fn columns_query_binds_table(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Positional placeholder for the 1-based parameter `n`.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", n),
            _ => "?".to_string(),
        }
    }

    /// Whether a named parameter appearing twice can reuse one placeholder.
    pub fn supports_numbered_placeholders(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }
}
