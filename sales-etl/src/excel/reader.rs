//! Read regional sales records from a workbook or CSV file

use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::error::EtlError;
use crate::sales::types::float_to_i64;
use crate::sales::{OrderId, RawSalesRecord, Region};

/// Header names (case-sensitive)
pub mod cols {
    pub const ORDER_ID: &str = "OrderId";
    pub const ORDER_ITEM_ID: &str = "OrderItemId";
    pub const QUANTITY_ORDERED: &str = "QuantityOrdered";
    pub const ITEM_PRICE: &str = "ItemPrice";
    pub const PROMOTION_DISCOUNT: &str = "PromotionDiscount";

    pub const REQUIRED: [&str; 5] = [
        ORDER_ID,
        ORDER_ITEM_ID,
        QUANTITY_ORDERED,
        ITEM_PRICE,
        PROMOTION_DISCOUNT,
    ];
}

static EMPTY_CELL: Data = Data::Empty;

/// Rows of a sheet, with the 0-based sheet row of the first entry
struct SheetRows {
    first_row: usize,
    rows: Vec<Vec<Data>>,
}

/// Read every data row of a sales sheet, in sheet order
///
/// `.csv` files go through the CSV parser; anything else is opened as a
/// workbook. `sheet` selects a worksheet by name, defaulting to the first.
pub fn read_sales_records(
    path: &Path,
    region: &Region,
    sheet: Option<&str>,
) -> Result<Vec<RawSalesRecord>, EtlError> {
    if !path.exists() {
        return Err(EtlError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let sheet_rows = if is_csv(path) {
        read_csv_rows(path)?
    } else {
        read_workbook_rows(path, sheet)?
    };

    let records = parse_rows(path, region, &sheet_rows)?;
    log::info!(
        "Read {} records from {} (region {})",
        records.len(),
        path.display(),
        region
    );

    Ok(records)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn read_workbook_rows(path: &Path, sheet: Option<&str>) -> Result<SheetRows, EtlError> {
    let read_error = |message: String| EtlError::Read {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| read_error(e.to_string()))?;
    let sheet_names = workbook.sheet_names();

    let sheet_name = match sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(EtlError::Schema {
                    path: path.to_path_buf(),
                    message: format!(
                        "sheet '{}' not found (available: {})",
                        name,
                        sheet_names.join(", ")
                    ),
                });
            }
            name.to_string()
        }
        None => sheet_names.first().cloned().ok_or_else(|| EtlError::Schema {
            path: path.to_path_buf(),
            message: "workbook has no sheets".to_string(),
        })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| read_error(format!("sheet '{}': {}", sheet_name, e)))?;

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    log::debug!(
        "Sheet '{}' of {} starts at row {}",
        sheet_name,
        path.display(),
        first_row + 1
    );

    Ok(SheetRows {
        first_row,
        rows: range.rows().map(|row| row.to_vec()).collect(),
    })
}

fn read_csv_rows(path: &Path) -> Result<SheetRows, EtlError> {
    let read_error = |e: csv::Error| EtlError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(read_error)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(read_error)?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Data::Empty
                    } else {
                        Data::String(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(SheetRows { first_row: 0, rows })
}

/// Column positions of the required headers
struct ColumnIndices {
    order_id: usize,
    order_item_id: usize,
    quantity_ordered: usize,
    item_price: usize,
    promotion_discount: usize,
}

fn parse_header(path: &Path, header: &[Data]) -> Result<ColumnIndices, EtlError> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (col, cell) in header.iter().enumerate() {
        if let Data::String(name) = cell {
            if let Some(required) = cols::REQUIRED.iter().find(|c| **c == name.trim()) {
                positions.entry(*required).or_insert(col);
            }
        }
    }

    let missing: Vec<&str> = cols::REQUIRED
        .iter()
        .copied()
        .filter(|c| !positions.contains_key(c))
        .collect();
    if !missing.is_empty() {
        return Err(EtlError::Schema {
            path: path.to_path_buf(),
            message: format!("missing required column(s): {}", missing.join(", ")),
        });
    }

    Ok(ColumnIndices {
        order_id: positions[cols::ORDER_ID],
        order_item_id: positions[cols::ORDER_ITEM_ID],
        quantity_ordered: positions[cols::QUANTITY_ORDERED],
        item_price: positions[cols::ITEM_PRICE],
        promotion_discount: positions[cols::PROMOTION_DISCOUNT],
    })
}

fn parse_rows(
    path: &Path,
    region: &Region,
    sheet_rows: &SheetRows,
) -> Result<Vec<RawSalesRecord>, EtlError> {
    let Some((header, data_rows)) = sheet_rows.rows.split_first() else {
        return Err(EtlError::Schema {
            path: path.to_path_buf(),
            message: "sheet is empty, expected a header row".to_string(),
        });
    };

    let indices = parse_header(path, header)?;
    let mut records = Vec::with_capacity(data_rows.len());

    for (idx, row) in data_rows.iter().enumerate() {
        // Trailing formatted-but-empty rows
        if row.iter().all(is_blank) {
            continue;
        }

        // 1-based; the header occupies first_row
        let cells = RowCells {
            path,
            row,
            row_number: sheet_rows.first_row + idx + 2,
        };

        records.push(RawSalesRecord {
            order_id: cells.order_id(indices.order_id)?,
            order_item_id: cells.integer(indices.order_item_id, cols::ORDER_ITEM_ID)?,
            quantity_ordered: cells.integer(indices.quantity_ordered, cols::QUANTITY_ORDERED)?,
            item_price: cells.decimal(indices.item_price, cols::ITEM_PRICE)?,
            promotion_discount: cells
                .optional_decimal(indices.promotion_discount, cols::PROMOTION_DISCOUNT)?,
            region: region.clone(),
        });
    }

    Ok(records)
}

/// Typed access to the cells of one data row
struct RowCells<'a> {
    path: &'a Path,
    row: &'a [Data],
    row_number: usize,
}

impl RowCells<'_> {
    fn cell(&self, col: usize) -> &Data {
        self.row.get(col).unwrap_or(&EMPTY_CELL)
    }

    fn coercion_error(&self, col: usize, column: &str, expected: &'static str) -> EtlError {
        EtlError::TypeCoercion {
            path: self.path.to_path_buf(),
            row: self.row_number,
            column: column.to_string(),
            value: cell_text(self.cell(col)),
            expected,
        }
    }

    fn integer(&self, col: usize, column: &str) -> Result<i64, EtlError> {
        cell_to_i64(self.cell(col)).ok_or_else(|| self.coercion_error(col, column, "an integer"))
    }

    fn decimal(&self, col: usize, column: &str) -> Result<f64, EtlError> {
        cell_to_f64(self.cell(col)).ok_or_else(|| self.coercion_error(col, column, "a decimal"))
    }

    fn optional_decimal(&self, col: usize, column: &str) -> Result<Option<f64>, EtlError> {
        let cell = self.cell(col);
        if is_blank(cell) {
            return Ok(None);
        }
        cell_to_f64(cell)
            .map(Some)
            .ok_or_else(|| self.coercion_error(col, column, "a decimal"))
    }

    fn order_id(&self, col: usize) -> Result<Option<OrderId>, EtlError> {
        match self.cell(col) {
            Data::Empty => Ok(None),
            Data::String(s) => Ok(OrderId::parse(s)),
            Data::Int(i) => Ok(Some(OrderId::Numeric(*i))),
            Data::Float(f) => float_to_i64(*f)
                .map(|n| Some(OrderId::Numeric(n)))
                .ok_or_else(|| self.coercion_error(col, cols::ORDER_ID, "an order identifier")),
            _ => Err(self.coercion_error(col, cols::ORDER_ID, "an order identifier")),
        }
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cell_to_i64(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::Float(f) => float_to_i64(*f),
        Data::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))
        }
        _ => None,
    }
}

fn cell_to_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) if f.is_finite() => Some(*f),
        Data::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Cell rendered for error messages
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
