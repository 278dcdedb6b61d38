//! Schema creation, upsert and read-back for `sales_data`

use sqlx::sqlite::SqliteConnection;
use sqlx::{Connection, Row};

use super::{SalesStore, release};
use crate::error::EtlError;
use crate::sales::{OrderId, Region, TransformedSalesRecord};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS sales_data (
        OrderItemId INTEGER PRIMARY KEY,
        OrderId INTEGER,
        QuantityOrdered INTEGER,
        ItemPrice REAL,
        TotalSales REAL,
        Region TEXT,
        PromotionDiscount REAL
    )
"#;

// Every column is overwritten so a repeated key replaces the whole row
const UPSERT_SQL: &str = r#"
    INSERT INTO sales_data (
        OrderItemId, OrderId, QuantityOrdered, ItemPrice, TotalSales, Region, PromotionDiscount
    )
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(OrderItemId) DO UPDATE SET
        OrderId = excluded.OrderId,
        QuantityOrdered = excluded.QuantityOrdered,
        ItemPrice = excluded.ItemPrice,
        TotalSales = excluded.TotalSales,
        Region = excluded.Region,
        PromotionDiscount = excluded.PromotionDiscount
"#;

const SELECT_ALL_SQL: &str = r#"
    SELECT
        OrderItemId,
        typeof(OrderId) AS order_id_type,
        CAST(OrderId AS TEXT) AS order_id_text,
        QuantityOrdered,
        ItemPrice,
        TotalSales,
        Region,
        PromotionDiscount
    FROM sales_data
    ORDER BY OrderItemId
"#;

impl SalesStore {
    /// Create `sales_data` if it does not exist. Never alters an existing table.
    pub async fn ensure_schema(&self) -> Result<(), EtlError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query(CREATE_TABLE_SQL)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|source| EtlError::StoreWrite {
                order_item_id: None,
                source,
            });
        release(conn).await;
        result
    }

    /// Insert or fully replace each record by `OrderItemId`
    ///
    /// All rows are committed in a single transaction. Returns the number of
    /// rows written.
    pub async fn upsert(&self, records: &[TransformedSalesRecord]) -> Result<u64, EtlError> {
        let mut conn = self.connect().await?;
        let result = upsert_records(&mut conn, records).await;
        release(conn).await;

        if let Ok(written) = &result {
            log::info!("Upserted {} rows into {}", written, self.location().display());
        }
        result
    }

    /// Every stored row, ordered by `OrderItemId`
    pub async fn stored_records(&self) -> Result<Vec<TransformedSalesRecord>, EtlError> {
        let mut conn = self.connect_read_only().await?;
        let result = fetch_records(&mut conn).await;
        release(conn).await;
        result
    }
}

async fn upsert_records(
    conn: &mut SqliteConnection,
    records: &[TransformedSalesRecord],
) -> Result<u64, EtlError> {
    let mut tx = conn.begin().await.map_err(|source| EtlError::StoreWrite {
        order_item_id: None,
        source,
    })?;

    for record in records {
        let query = sqlx::query(UPSERT_SQL).bind(record.order_item_id());
        let query = match record.order_id() {
            Some(OrderId::Numeric(n)) => query.bind(*n),
            Some(OrderId::Text(s)) => query.bind(s.as_str()),
            None => query.bind(None::<i64>),
        };

        query
            .bind(record.quantity_ordered())
            .bind(record.item_price())
            .bind(record.total_sales())
            .bind(record.region().as_str())
            .bind(record.promotion_discount())
            .execute(&mut *tx)
            .await
            .map_err(|source| EtlError::StoreWrite {
                order_item_id: Some(record.order_item_id()),
                source,
            })?;
    }

    tx.commit().await.map_err(|source| EtlError::StoreWrite {
        order_item_id: None,
        source,
    })?;

    Ok(records.len() as u64)
}

async fn fetch_records(conn: &mut SqliteConnection) -> Result<Vec<TransformedSalesRecord>, EtlError> {
    let read_error = |source: sqlx::Error| EtlError::StoreRead {
        query: "select sales_data",
        source,
    };

    let rows = sqlx::query(SELECT_ALL_SQL)
        .fetch_all(&mut *conn)
        .await
        .map_err(read_error)?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let order_id_type: String = row.try_get("order_id_type").map_err(read_error)?;
        let order_id_text: Option<String> = row.try_get("order_id_text").map_err(read_error)?;
        let order_id = match (order_id_type.as_str(), order_id_text) {
            ("null", _) | (_, None) => None,
            ("integer", Some(text)) => text.parse::<i64>().ok().map(OrderId::Numeric),
            (_, Some(text)) => Some(OrderId::Text(text)),
        };

        let region: String = row.try_get("Region").map_err(read_error)?;
        let region =
            Region::new(&region).map_err(|e| read_error(sqlx::Error::Decode(Box::new(e))))?;

        records.push(TransformedSalesRecord::from_stored(
            row.try_get("OrderItemId").map_err(read_error)?,
            order_id,
            row.try_get("QuantityOrdered").map_err(read_error)?,
            row.try_get("ItemPrice").map_err(read_error)?,
            row.try_get("TotalSales").map_err(read_error)?,
            region,
            row.try_get("PromotionDiscount").map_err(read_error)?,
        ));
    }

    Ok(records)
}
