use serde::{Deserialize, Serialize};

use crate::models::CountItem;

/// Mismatch between expected and counted quantity for one counted item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountDiscrepancy {
    pub product_code: String,
    pub product_name: String,
    pub expected: f64,
    pub counted: f64,
    pub difference: f64,
    pub percentage_diff: f64,
    pub observations: Option<String>,
}

impl CountDiscrepancy {
    /// `None` for items without a recorded quantity or with an exact match.
    pub fn from_item(item: &CountItem) -> Option<Self> {
        if !item.is_counted {
            return None;
        }
        let counted = item.counted_quantity?;
        let difference = item.difference?;
        if difference == 0.0 {
            return None;
        }

        Some(Self {
            product_code: item.product_code().to_string(),
            product_name: item.product_name().to_string(),
            expected: item.expected_quantity,
            counted,
            difference,
            percentage_diff: percentage_diff(difference, item.expected_quantity),
            observations: item.observations.clone(),
        })
    }

    /// Difference larger than `ratio` of the expected quantity.
    pub fn is_large(&self, ratio: f64) -> bool {
        self.difference.abs() > self.expected * ratio
    }
}

/// `difference / expected * 100`. A zero expectation reports a full ±100%.
pub fn percentage_diff(difference: f64, expected: f64) -> f64 {
    if expected == 0.0 {
        if difference == 0.0 {
            0.0
        } else {
            100.0 * difference.signum()
        }
    } else {
        difference / expected * 100.0
    }
}

pub fn collect_discrepancies(items: &[CountItem]) -> Vec<CountDiscrepancy> {
    items.iter().filter_map(CountDiscrepancy::from_item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counting::test_support::item;
    use chrono::Utc;

    #[test]
    fn under_count_reports_negative_percentage() {
        let mut it = item("i1", "p1", 50.0);
        it.record_count(45.0, None, Utc::now());

        let discrepancy = CountDiscrepancy::from_item(&it).unwrap();
        assert_eq!(discrepancy.difference, -5.0);
        assert!((discrepancy.percentage_diff - -10.0).abs() < 1e-9);
        assert_eq!(discrepancy.product_code, "P-p1");
    }

    #[test]
    fn exact_match_and_uncounted_items_are_not_discrepancies() {
        let mut matched = item("i1", "p1", 30.0);
        matched.record_count(30.0, None, Utc::now());
        let pending = item("i2", "p2", 10.0);

        assert!(collect_discrepancies(&[matched, pending]).is_empty());
    }

    #[test]
    fn zero_expectation_caps_at_full_percentage() {
        assert_eq!(percentage_diff(4.0, 0.0), 100.0);
        assert_eq!(percentage_diff(0.0, 0.0), 0.0);
    }

    #[test]
    fn large_difference_uses_ratio_of_expected() {
        let mut it = item("i1", "p1", 50.0);
        it.record_count(61.0, Some("extra pallet".into()), Utc::now());
        let discrepancy = CountDiscrepancy::from_item(&it).unwrap();

        assert!(discrepancy.is_large(0.2));
        assert!(!discrepancy.is_large(0.25));
        assert_eq!(discrepancy.observations.as_deref(), Some("extra pallet"));
    }
}
