//! Merge regional record sequences into one deduplicated, enriched sequence
//!
//! Sources are concatenated in the order given and walked once. The first
//! record carrying a given order id wins; later records with the same id are
//! dropped whole, whichever region they come from. Records without an order
//! id are always kept.

use std::collections::HashSet;

use serde::Serialize;

use super::types::{OrderId, RawSalesRecord, Region, TransformedSalesRecord};

/// A record discarded because its order id was already taken
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRecord {
    pub order_id: OrderId,
    pub order_item_id: i64,
    pub region: Region,
}

/// Result of a merge pass
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Retained records, in concatenation order
    pub records: Vec<TransformedSalesRecord>,
    /// Records dropped as duplicate order ids, in concatenation order
    pub dropped: Vec<DroppedRecord>,
}

/// Merge two regions, A before B
pub fn merge_regions(a: Vec<RawSalesRecord>, b: Vec<RawSalesRecord>) -> MergeOutcome {
    merge_sources([a, b])
}

/// Merge two regions and return only the retained records
pub fn transform_data(
    a: Vec<RawSalesRecord>,
    b: Vec<RawSalesRecord>,
) -> Vec<TransformedSalesRecord> {
    merge_regions(a, b).records
}

/// Merge any number of sources in the given order
pub fn merge_sources<I>(sources: I) -> MergeOutcome
where
    I: IntoIterator<Item = Vec<RawSalesRecord>>,
{
    let mut seen: HashSet<OrderId> = HashSet::new();
    let mut outcome = MergeOutcome::default();

    for raw in sources.into_iter().flatten() {
        if let Some(order_id) = &raw.order_id {
            if seen.contains(order_id) {
                log::debug!(
                    "Dropping OrderItemId {} from region {}: OrderId {} already loaded",
                    raw.order_item_id,
                    raw.region,
                    order_id
                );
                outcome.dropped.push(DroppedRecord {
                    order_id: order_id.clone(),
                    order_item_id: raw.order_item_id,
                    region: raw.region,
                });
                continue;
            }
            seen.insert(order_id.clone());
        }

        outcome.records.push(TransformedSalesRecord::from_raw(raw));
    }

    if !outcome.dropped.is_empty() {
        log::info!(
            "Dropped {} records with duplicate OrderId values",
            outcome.dropped.len()
        );
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(label: &str) -> Region {
        Region::new(label).unwrap()
    }

    fn raw(order: Option<i64>, item: i64, qty: i64, price: f64, label: &str) -> RawSalesRecord {
        RawSalesRecord {
            order_id: order.map(OrderId::from),
            order_item_id: item,
            quantity_ordered: qty,
            item_price: price,
            promotion_discount: None,
            region: region(label),
        }
    }

    #[test]
    fn test_cross_region_duplicate_keeps_region_a() {
        let a = vec![raw(Some(1), 10, 2, 5.00, "A")];
        let b = vec![raw(Some(1), 11, 3, 5.00, "B")];

        let outcome = merge_regions(a, b);

        assert_eq!(outcome.records.len(), 1);
        let kept = &outcome.records[0];
        assert_eq!(kept.order_item_id(), 10);
        assert_eq!(kept.total_sales(), 10.00);
        assert_eq!(kept.region().as_str(), "A");

        assert_eq!(
            outcome.dropped,
            vec![DroppedRecord {
                order_id: OrderId::Numeric(1),
                order_item_id: 11,
                region: region("B"),
            }]
        );
    }

    #[test]
    fn test_first_occurrence_wins_within_one_region() {
        let a = vec![
            raw(Some(5), 1, 1, 1.0, "A"),
            raw(Some(6), 2, 1, 1.0, "A"),
            raw(Some(5), 3, 1, 1.0, "A"),
        ];

        let records = transform_data(a, Vec::new());

        let items: Vec<i64> = records.iter().map(|r| r.order_item_id()).collect();
        assert_eq!(items, vec![1, 2]);
    }

    #[test]
    fn test_null_order_ids_always_retained() {
        let a = vec![raw(None, 1, 1, 1.0, "A"), raw(None, 2, 1, 1.0, "A")];
        let b = vec![raw(None, 3, 1, 1.0, "B"), raw(Some(9), 4, 1, 1.0, "B")];

        let outcome = merge_regions(a, b);

        let items: Vec<i64> = outcome.records.iter().map(|r| r.order_item_id()).collect();
        assert_eq!(items, vec![1, 2, 3, 4]);
        assert!(outcome.dropped.is_empty());
    }

    #[test]
    fn test_output_has_unique_order_ids_from_earliest_position() {
        let a = vec![
            raw(Some(1), 100, 1, 1.0, "A"),
            raw(Some(2), 101, 1, 1.0, "A"),
            raw(None, 102, 1, 1.0, "A"),
        ];
        let b = vec![
            raw(Some(2), 200, 9, 9.0, "B"),
            raw(Some(3), 201, 1, 1.0, "B"),
            raw(Some(1), 202, 9, 9.0, "B"),
            raw(Some(3), 203, 9, 9.0, "B"),
        ];

        let records = transform_data(a, b);

        let mut seen = HashSet::new();
        for record in &records {
            if let Some(id) = record.order_id() {
                assert!(seen.insert(id.clone()), "duplicate order id {}", id);
            }
        }
        let items: Vec<i64> = records.iter().map(|r| r.order_item_id()).collect();
        assert_eq!(items, vec![100, 101, 102, 201]);
    }

    #[test]
    fn test_text_and_numeric_ids_are_distinct() {
        let mut a = vec![raw(Some(7), 1, 1, 1.0, "A")];
        a.push(RawSalesRecord {
            order_id: Some(OrderId::Text("ORD-7".to_string())),
            ..raw(None, 2, 1, 1.0, "A")
        });
        let b = vec![RawSalesRecord {
            order_id: Some(OrderId::Text("ORD-7".to_string())),
            ..raw(None, 3, 1, 1.0, "B")
        }];

        let records = transform_data(a, b);

        let items: Vec<i64> = records.iter().map(|r| r.order_item_id()).collect();
        assert_eq!(items, vec![1, 2]);
    }

    #[test]
    fn test_parsed_integral_ids_match_numeric_ids() {
        let a = vec![raw(Some(1), 10, 2, 5.0, "A")];
        let b = vec![
            RawSalesRecord {
                order_id: OrderId::parse("1.0"),
                ..raw(None, 11, 3, 5.0, "B")
            },
            RawSalesRecord {
                order_id: OrderId::parse("1"),
                ..raw(None, 12, 1, 5.0, "B")
            },
        ];

        let outcome = merge_regions(a, b);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].order_item_id(), 10);
        let dropped: Vec<i64> = outcome.dropped.iter().map(|d| d.order_item_id).collect();
        assert_eq!(dropped, vec![11, 12]);
    }

    #[test]
    fn test_total_sales_arithmetic() {
        let a = vec![
            raw(Some(1), 1, 0, 19.99, "A"),
            raw(Some(2), 2, 3, 2.5, "A"),
            raw(Some(3), 3, -2, 4.0, "A"),
            raw(Some(4), 4, 2, -1.25, "A"),
        ];

        let totals: Vec<f64> = transform_data(a, Vec::new())
            .iter()
            .map(|r| r.total_sales())
            .collect();

        assert_eq!(totals, vec![0.0, 7.5, -8.0, -2.5]);
    }

    #[test]
    fn test_promotion_discount_passes_through() {
        let a = vec![RawSalesRecord {
            promotion_discount: Some(-3.0),
            ..raw(Some(1), 1, 1, 1.0, "A")
        }];

        let records = transform_data(a, Vec::new());

        assert_eq!(records[0].promotion_discount(), Some(-3.0));
    }

    #[test]
    fn test_empty_inputs() {
        let outcome = merge_regions(Vec::new(), Vec::new());

        assert!(outcome.records.is_empty());
        assert!(outcome.dropped.is_empty());
    }

    #[test]
    fn test_merge_sources_keeps_given_order() {
        let first = vec![raw(Some(1), 1, 1, 1.0, "C")];
        let second = vec![raw(Some(1), 2, 1, 1.0, "A")];
        let third = vec![raw(Some(1), 3, 1, 1.0, "B")];

        let outcome = merge_sources(vec![first, second, third]);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].region().as_str(), "C");
        assert_eq!(outcome.dropped.len(), 2);
    }
}
