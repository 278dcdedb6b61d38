//! Read-only checks over the loaded `sales_data` table

use serde::Serialize;
use sqlx::Row;
use sqlx::sqlite::SqliteConnection;

use super::{SalesStore, release};
use crate::error::EtlError;

/// Sum of total sales for one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionTotal {
    pub region: String,
    pub total_sales: f64,
}

/// An `OrderItemId` stored more than once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    pub order_item_id: i64,
    pub occurrences: i64,
}

/// Findings of a validation pass, in reporting order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub total_records: i64,
    /// One entry per region present, ordered by region label
    pub region_totals: Vec<RegionTotal>,
    /// `None` when the table is empty
    pub average_total_sales: Option<f64>,
    pub duplicate_order_item_ids: Vec<DuplicateKey>,
}

impl ValidationReport {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicate_order_item_ids.is_empty()
    }

    /// Total for a region label, if that region has rows
    pub fn region_total(&self, region: &str) -> Option<f64> {
        self.region_totals
            .iter()
            .find(|t| t.region == region)
            .map(|t| t.total_sales)
    }
}

/// Run the four validation queries against the store
pub async fn validate(store: &SalesStore) -> Result<ValidationReport, EtlError> {
    let mut conn = store.connect_read_only().await?;
    let result = run_queries(&mut conn).await;
    release(conn).await;
    result
}

async fn run_queries(conn: &mut SqliteConnection) -> Result<ValidationReport, EtlError> {
    let total_records: i64 = sqlx::query("SELECT COUNT(*) AS total_records FROM sales_data")
        .fetch_one(&mut *conn)
        .await
        .and_then(|row| row.try_get("total_records"))
        .map_err(|source| EtlError::StoreRead {
            query: "total records",
            source,
        })?;

    // TOTAL() always yields a float, even when every stored value is integral
    let region_totals = sqlx::query(
        r#"
        SELECT Region, TOTAL(TotalSales) AS total_sales
        FROM sales_data
        GROUP BY Region
        ORDER BY Region
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .and_then(|rows| {
        rows.into_iter()
            .map(|row| -> Result<RegionTotal, sqlx::Error> {
                Ok(RegionTotal {
                    region: row.try_get::<Option<String>, _>("Region")?.unwrap_or_default(),
                    total_sales: row.try_get("total_sales")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
    })
    .map_err(|source| EtlError::StoreRead {
        query: "total sales by region",
        source,
    })?;

    let average_total_sales: Option<f64> =
        sqlx::query("SELECT AVG(TotalSales) AS average_total_sales FROM sales_data")
            .fetch_one(&mut *conn)
            .await
            .and_then(|row| row.try_get("average_total_sales"))
            .map_err(|source| EtlError::StoreRead {
                query: "average sales per transaction",
                source,
            })?;

    let duplicate_order_item_ids = sqlx::query(
        r#"
        SELECT OrderItemId, COUNT(*) AS occurrences
        FROM sales_data
        GROUP BY OrderItemId
        HAVING COUNT(*) > 1
        ORDER BY OrderItemId
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .and_then(|rows| {
        rows.into_iter()
            .map(|row| -> Result<DuplicateKey, sqlx::Error> {
                Ok(DuplicateKey {
                    order_item_id: row.try_get("OrderItemId")?,
                    occurrences: row.try_get("occurrences")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
    })
    .map_err(|source| EtlError::StoreRead {
        query: "duplicate OrderItemId",
        source,
    })?;

    log::debug!(
        "Validated {} records across {} regions",
        total_records,
        region_totals.len()
    );

    Ok(ValidationReport {
        total_records,
        region_totals,
        average_total_sales,
        duplicate_order_item_ids,
    })
}
