//! Spreadsheet input for regional sales files

mod reader;

pub use reader::{cols, read_sales_records};
