//! Regional sales load: read spreadsheets, merge by order id, persist to
//! SQLite and validate the loaded table.

pub mod config;
pub mod error;
pub mod excel;
pub mod pipeline;
pub mod report;
pub mod sales;
pub mod store;

pub use config::{Config, SourceConfig};
pub use error::EtlError;
pub use pipeline::{PipelineSummary, run_pipeline};
pub use store::{SalesStore, StoreConfig, ValidationReport};
