//! SQLite store for merged sales records
//!
//! Each operation opens its own connection and closes it before returning,
//! on the error path as well.

mod sales;
pub mod validation;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};

use crate::error::EtlError;

pub use validation::{DuplicateKey, RegionTotal, ValidationReport, validate};

/// Name of the destination table
pub const SALES_TABLE: &str = "sales_data";

/// Default database file, relative to the working directory
pub const DEFAULT_DATABASE_PATH: &str = "sales_data.db";

/// Location and open options for the store
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite database file
    pub path: PathBuf,
    /// Create the file on first write if it does not exist
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
            create_if_missing: true,
        }
    }
}

impl StoreConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Handle to the `sales_data` table
#[derive(Debug, Clone)]
pub struct SalesStore {
    config: StoreConfig,
}

impl SalesStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn location(&self) -> &Path {
        &self.config.path
    }

    /// Open a read-write connection
    async fn connect(&self) -> Result<SqliteConnection, EtlError> {
        let options = SqliteConnectOptions::new()
            .filename(&self.config.path)
            .create_if_missing(self.config.create_if_missing);
        self.open(options).await
    }

    /// Open a connection that cannot modify the store
    async fn connect_read_only(&self) -> Result<SqliteConnection, EtlError> {
        let options = SqliteConnectOptions::new()
            .filename(&self.config.path)
            .read_only(true);
        self.open(options).await
    }

    async fn open(&self, options: SqliteConnectOptions) -> Result<SqliteConnection, EtlError> {
        log::debug!("Opening store {}", self.config.path.display());
        options
            .connect()
            .await
            .map_err(|source| EtlError::StoreConnection {
                location: self.config.path.clone(),
                source,
            })
    }
}

/// Close a connection, logging rather than masking the caller's result
async fn release(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        log::warn!("Failed to close store connection: {}", e);
    }
}
