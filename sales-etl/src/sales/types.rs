//! Sales record types shared by the reader, merger and store

use serde::{Deserialize, Serialize};

/// Order identifier as found in the source sheet
///
/// Most sheets carry numeric ids; text ids are kept as-is so they still
/// participate in deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum OrderId {
    Numeric(i64),
    Text(String),
}

impl OrderId {
    /// Parse an id from cell text. Blank text means no id.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        // "1.0" names the same order as "1" and a numeric cell holding 1
        let numeric = s
            .parse::<i64>()
            .ok()
            .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64));
        match numeric {
            Some(n) => Some(OrderId::Numeric(n)),
            None => Some(OrderId::Text(s.to_string())),
        }
    }
}

/// Largest magnitude at which every integer is exactly representable in f64
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Whole-number float as an integer; `None` for fractions, NaN and huge values
pub(crate) fn float_to_i64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT_INT {
        Some(f as i64)
    } else {
        None
    }
}

impl From<i64> for OrderId {
    fn from(n: i64) -> Self {
        OrderId::Numeric(n)
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderId::Numeric(n) => write!(f, "{}", n),
            OrderId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Region label attached to every record read from one file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

/// Error when building a region label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRegion;

impl std::fmt::Display for InvalidRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "region label cannot be empty")
    }
}

impl std::error::Error for InvalidRegion {}

impl Region {
    pub fn new(label: &str) -> Result<Self, InvalidRegion> {
        let label = label.trim();
        if label.is_empty() {
            return Err(InvalidRegion);
        }
        Ok(Region(label.to_string()))
    }

    /// Built-in label known to be non-blank
    pub(crate) fn fixed(label: &'static str) -> Self {
        debug_assert!(!label.trim().is_empty());
        Region(label.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Region {
    type Error = InvalidRegion;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        Region::new(&label)
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.0
    }
}

impl std::str::FromStr for Region {
    type Err = InvalidRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::new(s)
    }
}

/// One spreadsheet row, typed
#[derive(Debug, Clone, PartialEq)]
pub struct RawSalesRecord {
    pub order_id: Option<OrderId>,
    pub order_item_id: i64,
    pub quantity_ordered: i64,
    pub item_price: f64,
    pub promotion_discount: Option<f64>,
    pub region: Region,
}

/// A record shaped for the `sales_data` table
///
/// `total_sales` is always derived; there is no way to set it directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransformedSalesRecord {
    order_item_id: i64,
    order_id: Option<OrderId>,
    quantity_ordered: i64,
    item_price: f64,
    total_sales: f64,
    region: Region,
    promotion_discount: Option<f64>,
}

impl TransformedSalesRecord {
    /// Build from a raw record, computing total sales
    pub fn from_raw(raw: RawSalesRecord) -> Self {
        let total_sales = raw.quantity_ordered as f64 * raw.item_price;
        Self {
            order_item_id: raw.order_item_id,
            order_id: raw.order_id,
            quantity_ordered: raw.quantity_ordered,
            item_price: raw.item_price,
            total_sales,
            region: raw.region,
            promotion_discount: raw.promotion_discount,
        }
    }

    /// Rebuild from a persisted row (total is taken from the store as written)
    pub(crate) fn from_stored(
        order_item_id: i64,
        order_id: Option<OrderId>,
        quantity_ordered: i64,
        item_price: f64,
        total_sales: f64,
        region: Region,
        promotion_discount: Option<f64>,
    ) -> Self {
        Self {
            order_item_id,
            order_id,
            quantity_ordered,
            item_price,
            total_sales,
            region,
            promotion_discount,
        }
    }

    pub fn order_item_id(&self) -> i64 {
        self.order_item_id
    }

    pub fn order_id(&self) -> Option<&OrderId> {
        self.order_id.as_ref()
    }

    pub fn quantity_ordered(&self) -> i64 {
        self.quantity_ordered
    }

    pub fn item_price(&self) -> f64 {
        self.item_price
    }

    pub fn total_sales(&self) -> f64 {
        self.total_sales
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn promotion_discount(&self) -> Option<f64> {
        self.promotion_discount
    }
}
