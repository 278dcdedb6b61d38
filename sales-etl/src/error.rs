//! Error taxonomy for the load pipeline
//!
//! Every component returns `EtlError`; nothing is recovered from inside the
//! pipeline, so the first error aborts the whole run.

use std::path::PathBuf;

/// Failure raised by the reader, the store or the validator
#[derive(Debug)]
pub enum EtlError {
    /// Input file does not exist
    NotFound { path: PathBuf },
    /// Workbook is missing a required column, has no rows, or the sheet is unknown
    Schema { path: PathBuf, message: String },
    /// A cell could not be converted to the type its column requires
    TypeCoercion {
        path: PathBuf,
        /// 1-based sheet row (the header is row 1)
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },
    /// Workbook or CSV file exists but cannot be parsed
    Read { path: PathBuf, message: String },
    /// Store cannot be opened or created
    StoreConnection { location: PathBuf, source: sqlx::Error },
    /// A write to the store failed
    StoreWrite {
        /// Order item being written when the failure happened, if any
        order_item_id: Option<i64>,
        source: sqlx::Error,
    },
    /// A read-only query against the store failed
    StoreRead { query: &'static str, source: sqlx::Error },
}

impl EtlError {
    /// Process exit code for this class of failure
    pub fn exit_code(&self) -> u8 {
        match self {
            EtlError::NotFound { .. }
            | EtlError::Schema { .. }
            | EtlError::TypeCoercion { .. }
            | EtlError::Read { .. } => 2,
            EtlError::StoreConnection { .. }
            | EtlError::StoreWrite { .. }
            | EtlError::StoreRead { .. } => 3,
        }
    }

    /// Short name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            EtlError::NotFound { .. } => "NotFound",
            EtlError::Schema { .. } => "SchemaError",
            EtlError::TypeCoercion { .. } => "TypeCoercionError",
            EtlError::Read { .. } => "ReadError",
            EtlError::StoreConnection { .. } => "StoreConnectionError",
            EtlError::StoreWrite { .. } => "StoreWriteError",
            EtlError::StoreRead { .. } => "StoreReadError",
        }
    }
}

impl std::fmt::Display for EtlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EtlError::NotFound { path } => {
                write!(f, "input file not found: {}", path.display())
            }
            EtlError::Schema { path, message } => {
                write!(f, "{}: {}", path.display(), message)
            }
            EtlError::TypeCoercion {
                path,
                row,
                column,
                value,
                expected,
            } => write!(
                f,
                "{}: row {}, column '{}': cannot convert '{}' to {}",
                path.display(),
                row,
                column,
                value,
                expected
            ),
            EtlError::Read { path, message } => {
                write!(f, "failed to read {}: {}", path.display(), message)
            }
            EtlError::StoreConnection { location, source } => {
                write!(f, "cannot open store {}: {}", location.display(), source)
            }
            EtlError::StoreWrite {
                order_item_id: Some(id),
                source,
            } => write!(f, "failed to write OrderItemId {}: {}", id, source),
            EtlError::StoreWrite {
                order_item_id: None,
                source,
            } => write!(f, "failed to write to store: {}", source),
            EtlError::StoreRead { query, source } => {
                write!(f, "store query '{}' failed: {}", query, source)
            }
        }
    }
}

impl std::error::Error for EtlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EtlError::StoreConnection { source, .. }
            | EtlError::StoreWrite { source, .. }
            | EtlError::StoreRead { source, .. } => Some(source),
            _ => None,
        }
    }
}
