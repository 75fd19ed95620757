//! # Magento installation settings
//!
//! Everything the tool needs to know about the target store comes from the
//! Magento root directory:
//!
//! - **Root resolution**: `--path` or the working directory, which must
//!   contain `app/etc/env.php`
//! - **Database**: `db.connection.default` inside `env.php`
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let root = resolve_magento_root(None)?;
//! let db = load_database_config(&root)?;
//! println!("Database: {}", db.describe());
//! ```

pub mod env_php;

pub use env_php::PhpValue;

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::DatabaseConfig;
use crate::error::ConfigError;

/// Location of the deployment config relative to the Magento root
pub const ENV_PHP: &str = "app/etc/env.php";

const CONNECTION_PATH: &str = "db.connection.default";

/// Resolve and validate the Magento root directory.
pub fn resolve_magento_root(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let root = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().map_err(|source| ConfigError::Unreadable {
            path: PathBuf::from("."),
            source,
        })?,
    };

    if !root.join(ENV_PHP).is_file() {
        return Err(ConfigError::NotMagentoRoot { path: root });
    }

    debug!("Magento root: {}", root.display());
    Ok(root)
}

/// Read the default database connection from `app/etc/env.php`.
///
/// `host` falls back to `127.0.0.1` and `password` to empty; `dbname` and
/// `username` are required.
pub fn load_database_config(magento_root: &Path) -> Result<DatabaseConfig, ConfigError> {
    let env_path = magento_root.join(ENV_PHP);
    let source = std::fs::read_to_string(&env_path).map_err(|source| ConfigError::Unreadable {
        path: env_path.clone(),
        source,
    })?;

    database_config_from_env(&env_php::parse(&source)?)
}

/// Extract the connection settings from a parsed env.php array
pub fn database_config_from_env(env: &PhpValue) -> Result<DatabaseConfig, ConfigError> {
    let connection = env
        .path(CONNECTION_PATH)
        .filter(|v| matches!(v, PhpValue::Array(_)))
        .ok_or_else(|| ConfigError::MissingField {
            field: CONNECTION_PATH.to_string(),
        })?;

    let text = |key: &str| connection.get(key).and_then(PhpValue::as_text);
    let required = |key: &str| {
        text(key).ok_or_else(|| ConfigError::MissingField {
            field: format!("{}.{}", CONNECTION_PATH, key),
        })
    };

    DatabaseConfig::from_parts(
        text("host").as_deref(),
        required("dbname")?,
        required("username")?,
        text("password").unwrap_or_default(),
    )
}
