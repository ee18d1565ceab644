//! Property-based tests for the query model
//!
//! Uses proptest to generate random rows and verify ordering and filtering

use proptest::prelude::*;
use serde_json::{json, Value};
use share_everything::backend::{Filter, Query};
use share_everything::shared::attachment::attachment_file_name;

fn rows(timestamps: &[i64]) -> Vec<Value> {
    timestamps
        .iter()
        .enumerate()
        .map(|(i, ts)| json!({"id": i, "timestamp": ts}))
        .collect()
}

proptest! {
    #[test]
    fn test_ascending_order_is_sorted(timestamps in prop::collection::vec(any::<i64>(), 0..50)) {
        let input = rows(&timestamps);
        let output = Query::new().order_by("timestamp", true).apply(&input);

        prop_assert_eq!(output.len(), input.len());
        let sorted: Vec<i64> = output.iter().filter_map(|r| r["timestamp"].as_i64()).collect();
        prop_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_descending_order_is_reverse_sorted(timestamps in prop::collection::vec(any::<i64>(), 0..50)) {
        let input = rows(&timestamps);
        let output = Query::new().order_by("timestamp", false).apply(&input);

        let sorted: Vec<i64> = output.iter().filter_map(|r| r["timestamp"].as_i64()).collect();
        prop_assert!(sorted.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_ties_keep_insertion_order(timestamps in prop::collection::vec(0i64..3, 0..30)) {
        let input = rows(&timestamps);
        let output = Query::new().order_by("timestamp", true).apply(&input);

        for pair in output.windows(2) {
            if pair[0]["timestamp"] == pair[1]["timestamp"] {
                prop_assert!(pair[0]["id"].as_u64() < pair[1]["id"].as_u64());
            }
        }
    }

    #[test]
    fn test_limit_never_exceeded(timestamps in prop::collection::vec(any::<i64>(), 0..30), limit in 0usize..10) {
        let input = rows(&timestamps);
        let output = Query::new().limit(limit).apply(&input);
        prop_assert_eq!(output.len(), input.len().min(limit));
    }

    #[test]
    fn test_eq_filter_selects_exact_matches(values in prop::collection::vec("[a-c]", 0..20), needle in "[a-c]") {
        let input: Vec<Value> = values.iter().map(|v| json!({"sender": v})).collect();
        let output = Query::new().filter(Filter::eq("sender", needle.clone())).apply(&input);

        prop_assert_eq!(output.len(), values.iter().filter(|v| **v == needle).count());
    }

    #[test]
    fn test_attachment_names_are_flat(name in ".{0,40}", millis in 0i64..i64::MAX) {
        let stored = attachment_file_name(&name, millis);
        let prefix = format!("file_{}_", millis);
        prop_assert!(stored.starts_with(&prefix));
        prop_assert!(!stored.contains('/'));
        prop_assert!(!stored.contains('\\'));
    }
}
