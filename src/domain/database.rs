//! Database connection settings

use crate::error::ConfigError;

pub const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_HOST: &str = "127.0.0.1";

/// Connection settings for the Magento database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    /// Unix socket, when the host entry reads `localhost:/path/to/mysqld.sock`
    pub socket: Option<String>,
    pub dbname: String,
    pub username: String,
    pub password: String,
}

impl DatabaseConfig {
    /// Build from Magento-style settings where `host` may carry `:port`
    /// or `:/socket/path`.
    pub fn from_parts(
        host: Option<&str>,
        dbname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let host = host.map(str::trim).filter(|h| !h.is_empty()).unwrap_or(DEFAULT_HOST);

        let (host, port, socket) = match host.split_once(':') {
            Some((name, rest)) if rest.starts_with('/') => {
                (name.to_string(), DEFAULT_MYSQL_PORT, Some(rest.to_string()))
            }
            Some((name, rest)) => {
                let port = rest.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                    field: "db.connection.default.host".to_string(),
                    value: host.to_string(),
                })?;
                (name.to_string(), port, None)
            }
            None => (host.to_string(), DEFAULT_MYSQL_PORT, None),
        };

        Ok(Self {
            host,
            port,
            socket,
            dbname: dbname.into(),
            username: username.into(),
            password: password.into(),
        })
    }

    /// `dbname@host:port`, for display
    pub fn describe(&self) -> String {
        match &self.socket {
            Some(socket) => format!("{}@{}:{}", self.dbname, self.host, socket),
            None => format!("{}@{}:{}", self.dbname, self.host, self.port),
        }
    }
}
