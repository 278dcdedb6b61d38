//! End-to-end load: read every source, merge, persist, validate
//!
//! Steps run strictly one after another. Sources are merged in configured
//! order, so which duplicate wins never depends on read timing.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::Config;
use crate::error::EtlError;
use crate::excel::read_sales_records;
use crate::sales::{DroppedRecord, Region, merge_sources};
use crate::store::{SalesStore, ValidationReport, validate};

/// Rows read from one source
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub region: Region,
    pub path: PathBuf,
    pub records: usize,
}

/// What a pipeline run did, plus the validation findings
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub sources: Vec<SourceSummary>,
    /// Records kept after deduplication
    pub merged_records: usize,
    /// Records discarded as duplicate order ids
    pub dropped: Vec<DroppedRecord>,
    pub upserted: u64,
    pub report: ValidationReport,
}

/// Run the whole pipeline; the first failure aborts the run
pub async fn run_pipeline(config: &Config) -> Result<PipelineSummary, EtlError> {
    let mut sources = Vec::with_capacity(config.sources.len());
    let mut batches = Vec::with_capacity(config.sources.len());

    for source in &config.sources {
        let records = read_sales_records(&source.path, &source.region, source.sheet.as_deref())?;
        sources.push(SourceSummary {
            region: source.region.clone(),
            path: source.path.clone(),
            records: records.len(),
        });
        batches.push(records);
    }

    let outcome = merge_sources(batches);
    log::info!(
        "Merged {} records ({} dropped as duplicate OrderId)",
        outcome.records.len(),
        outcome.dropped.len()
    );

    let store = SalesStore::new(config.database.clone());
    store.ensure_schema().await?;
    let upserted = store.upsert(&outcome.records).await?;
    let report = validate(&store).await?;

    Ok(PipelineSummary {
        sources,
        merged_records: outcome.records.len(),
        dropped: outcome.dropped,
        upserted,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::excel::cols;
    use crate::sales::OrderId;
    use crate::store::StoreConfig;
    use rust_xlsxwriter::Workbook;
    use std::path::Path;
    use tempfile::TempDir;

    /// (order id, item id, quantity, price)
    type Row = (Option<f64>, f64, f64, f64);

    fn write_orders(path: &Path, rows: &[Row]) {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (col, title) in cols::REQUIRED.iter().enumerate() {
            worksheet.write_string(0, col as u16, *title).unwrap();
        }
        for (idx, (order, item, qty, price)) in rows.iter().enumerate() {
            let row = (idx + 1) as u32;
            if let Some(order) = order {
                worksheet.write_number(row, 0, *order).unwrap();
            }
            worksheet.write_number(row, 1, *item).unwrap();
            worksheet.write_number(row, 2, *qty).unwrap();
            worksheet.write_number(row, 3, *price).unwrap();
        }
        workbook.save(path).unwrap();
    }

    fn config_for(dir: &TempDir, a: &[Row], b: &[Row]) -> Config {
        let path_a = dir.path().join("order_region_a.xlsx");
        let path_b = dir.path().join("order_region_b.xlsx");
        write_orders(&path_a, a);
        write_orders(&path_b, b);

        Config {
            database: StoreConfig::at(dir.path().join("sales_data.db")),
            sources: vec![
                SourceConfig::new(Region::new("A").unwrap(), path_a),
                SourceConfig::new(Region::new("B").unwrap(), path_b),
            ],
        }
    }

    #[tokio::test]
    async fn test_cross_region_duplicate_scenario() {
        let dir = TempDir::new().unwrap();
        let config = config_for(
            &dir,
            &[(Some(1.0), 10.0, 2.0, 5.00)],
            &[(Some(1.0), 11.0, 3.0, 5.00)],
        );

        let summary = run_pipeline(&config).await.unwrap();

        assert_eq!(summary.merged_records, 1);
        assert_eq!(summary.upserted, 1);
        assert_eq!(summary.dropped.len(), 1);
        assert_eq!(summary.dropped[0].order_item_id, 11);

        let report = &summary.report;
        assert_eq!(report.total_records, 1);
        assert_eq!(report.region_total("A"), Some(10.0));
        assert_eq!(report.region_total("B"), None);
        assert_eq!(report.average_total_sales, Some(10.0));
        assert!(!report.has_duplicates());

        let stored = SalesStore::new(config.database.clone())
            .stored_records()
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].order_item_id(), 10);
        assert_eq!(stored[0].order_id(), Some(&OrderId::Numeric(1)));
        assert_eq!(stored[0].region().as_str(), "A");
    }

    #[tokio::test]
    async fn test_rerun_replaces_rows_by_order_item() {
        let dir = TempDir::new().unwrap();
        let config = config_for(
            &dir,
            &[(Some(1.0), 10.0, 2.0, 5.0), (None, 12.0, 1.0, 3.0)],
            &[(None, 13.0, 1.0, 4.0)],
        );

        run_pipeline(&config).await.unwrap();
        let summary = run_pipeline(&config).await.unwrap();

        assert_eq!(summary.report.total_records, 3);
        assert_eq!(summary.report.region_total("A"), Some(13.0));
        assert_eq!(summary.report.region_total("B"), Some(4.0));
        assert!(!summary.report.has_duplicates());
    }

    #[tokio::test]
    async fn test_missing_source_aborts_before_store_is_touched() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(&dir, &[], &[]);
        config.sources[1].path = dir.path().join("absent.xlsx");

        let err = run_pipeline(&config).await.unwrap_err();

        assert!(matches!(err, EtlError::NotFound { .. }));
        assert!(!config.database.path.exists());
    }

    #[tokio::test]
    async fn test_empty_sources_load_empty_store() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir, &[], &[]);

        let summary = run_pipeline(&config).await.unwrap();

        assert_eq!(summary.merged_records, 0);
        assert_eq!(summary.report.total_records, 0);
        assert_eq!(summary.report.average_total_sales, None);
        assert!(summary.report.region_totals.is_empty());
    }

    #[tokio::test]
    async fn test_integral_order_id_text_dedupes_across_sources() {
        let dir = TempDir::new().unwrap();
        let path_a = dir.path().join("order_region_a.xlsx");
        let path_b = dir.path().join("order_region_b.csv");
        let path_c = dir.path().join("order_region_c.csv");
        write_orders(&path_a, &[(Some(1.0), 10.0, 2.0, 5.0)]);
        std::fs::write(
            &path_b,
            "OrderId,OrderItemId,QuantityOrdered,ItemPrice,PromotionDiscount\n1.0,11,3,5.00,\n",
        )
        .unwrap();
        std::fs::write(
            &path_c,
            "OrderId,OrderItemId,QuantityOrdered,ItemPrice,PromotionDiscount\n1,12,1,5.00,\n",
        )
        .unwrap();
        let config = Config {
            database: StoreConfig::at(dir.path().join("sales_data.db")),
            sources: vec![
                SourceConfig::new(Region::new("A").unwrap(), path_a),
                SourceConfig::new(Region::new("B").unwrap(), path_b),
                SourceConfig::new(Region::new("C").unwrap(), path_c),
            ],
        };

        let summary = run_pipeline(&config).await.unwrap();

        assert_eq!(summary.merged_records, 1);
        assert_eq!(summary.dropped.len(), 2);
        assert_eq!(summary.report.total_records, 1);
        assert_eq!(summary.report.region_total("A"), Some(10.0));

        let stored = SalesStore::new(config.database.clone())
            .stored_records()
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].order_item_id(), 10);
    }
}
