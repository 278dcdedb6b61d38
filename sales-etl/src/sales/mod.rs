//! Sales records and the merge/transform step

pub mod merge;
pub mod types;

pub use merge::{DroppedRecord, MergeOutcome, merge_regions, merge_sources, transform_data};
pub use types::{InvalidRegion, OrderId, RawSalesRecord, Region, TransformedSalesRecord};
