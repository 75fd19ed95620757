//! Database gateway
//!
//! Thin wrapper over a single MySQL connection. Statements go over the text
//! protocol (`sqlx::raw_sql`) because MySQL cannot prepare most of the DDL,
//! trigger and routine statements the migration files contain.

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Row as _, ValueRef};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::domain::DatabaseConfig;
use crate::error::DatabaseError;

/// One result row, column name → value
pub type Row = BTreeMap<String, SqlValue>;

/// A decoded column value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::UInt(v) => i64::try_from(*v).ok(),
            SqlValue::Text(s) => s.trim().parse().ok(),
            SqlValue::Float(_) | SqlValue::Null => None,
        }
    }

    /// String form of a non-null value
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Int(v) => Some(v.to_string()),
            SqlValue::UInt(v) => Some(v.to_string()),
            SqlValue::Float(v) => Some(v.to_string()),
            SqlValue::Text(s) => Some(s.clone()),
        }
    }
}

/// Statement execution and query primitives used by the runner and the
/// snapshot capturer. Calls are issued one at a time.
#[allow(async_fn_in_trait)]
pub trait DatabaseGateway {
    /// Execute one statement, returning the affected row count
    async fn execute(&mut self, sql: &str) -> Result<u64, DatabaseError>;

    /// Run a query and collect every row
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, DatabaseError>;

    async fn begin(&mut self) -> Result<(), DatabaseError>;

    /// No-op when no transaction is open
    async fn commit(&mut self) -> Result<(), DatabaseError>;

    /// No-op when no transaction is open
    async fn rollback(&mut self) -> Result<(), DatabaseError>;
}

/// Gateway backed by one `sqlx` MySQL connection
#[derive(Default)]
pub struct MySqlGateway {
    conn: Option<MySqlConnection>,
    in_transaction: bool,
}

impl MySqlGateway {
    /// Create a disconnected gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the connection described by `config`
    pub async fn connect(&mut self, config: &DatabaseConfig) -> Result<(), DatabaseError> {
        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.dbname)
            .charset("utf8mb4");

        if let Some(socket) = &config.socket {
            options = options.socket(socket);
        }

        info!("Connecting to MySQL at {}", config.describe());
        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                message: e.to_string(),
            })?;

        self.conn = Some(conn);
        self.in_transaction = false;
        Ok(())
    }

    fn connection(&mut self) -> Result<&mut MySqlConnection, DatabaseError> {
        self.conn.as_mut().ok_or(DatabaseError::NotConnected)
    }
}

impl DatabaseGateway for MySqlGateway {
    async fn execute(&mut self, sql: &str) -> Result<u64, DatabaseError> {
        let conn = self.connection()?;
        let result = sqlx::raw_sql(sql).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, DatabaseError> {
        let conn = self.connection()?;
        let rows = sqlx::raw_sql(sql).fetch_all(&mut *conn).await?;
        debug!("Query returned {} rows", rows.len());
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn begin(&mut self) -> Result<(), DatabaseError> {
        let conn = self.connection()?;
        sqlx::raw_sql("START TRANSACTION").execute(&mut *conn).await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        let open = self.in_transaction;
        let conn = self.connection()?;
        if open {
            sqlx::raw_sql("COMMIT").execute(&mut *conn).await?;
            self.in_transaction = false;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        let open = self.in_transaction;
        let conn = self.connection()?;
        if open {
            sqlx::raw_sql("ROLLBACK").execute(&mut *conn).await?;
            self.in_transaction = false;
        }
        Ok(())
    }
}

fn decode_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|column| {
            let idx = column.ordinal();
            (column.name().to_string(), decode_value(row, idx))
        })
        .collect()
}

// Text protocol rows carry column type info; try the decoders whose type
// check accepts the column, most specific first.
fn decode_value(row: &MySqlRow, idx: usize) -> SqlValue {
    match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return SqlValue::Null,
        Err(_) => return SqlValue::Null,
        Ok(_) => {}
    }

    if let Ok(v) = row.try_get::<i64, _>(idx) {
        SqlValue::Int(v)
    } else if let Ok(v) = row.try_get::<u64, _>(idx) {
        SqlValue::UInt(v)
    } else if let Ok(v) = row.try_get::<f64, _>(idx) {
        SqlValue::Float(v)
    } else if let Ok(v) = row.try_get::<String, _>(idx) {
        SqlValue::Text(v)
    } else if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
        SqlValue::Text(String::from_utf8_lossy(&v).to_string())
    } else {
        SqlValue::Null
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_as_i64() {
        assert_eq!(SqlValue::Int(42).as_i64(), Some(42));
        assert_eq!(SqlValue::UInt(7).as_i64(), Some(7));
        assert_eq!(SqlValue::UInt(u64::MAX).as_i64(), None);
        assert_eq!(SqlValue::Text(" 12 ".to_string()).as_i64(), Some(12));
        assert_eq!(SqlValue::Null.as_i64(), None);
    }

    #[test]
    fn test_sql_value_as_text() {
        assert_eq!(SqlValue::UInt(3_054_871_234).as_text().as_deref(), Some("3054871234"));
        assert_eq!(SqlValue::Text("x".to_string()).as_text().as_deref(), Some("x"));
        assert_eq!(SqlValue::Null.as_text(), None);
    }

    #[tokio::test]
    async fn test_disconnected_gateway_rejects_calls() {
        let mut gateway = MySqlGateway::new();
        let err = gateway.execute("SELECT 1").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotConnected));

        let err = gateway.query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotConnected));

        assert!(gateway.commit().await.is_err());
    }
}
