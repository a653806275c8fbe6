pub mod discrepancy;
pub mod manager;
pub mod state;
pub mod summary;
pub mod validation;

pub use discrepancy::{collect_discrepancies, CountDiscrepancy};
pub use manager::CountingSessionManager;
pub use state::{
    CountingProgress, CountingState, IgnoredReason, ItemStatus, SessionPhase, Transition,
};
pub use summary::CountingSummary;
pub use validation::{parse_quantity, validate_quantity, CountValidation};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{TimeZone, Utc};

    use crate::models::{CountItem, Product, Sector, SectorCount, SectorCountStatus};

    pub fn product(id: &str) -> Product {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        Product {
            id: id.to_string(),
            company_id: "acme".into(),
            code: format!("P-{id}"),
            name: format!("Product {id}"),
            description: None,
            unit_measure: Some("un".into()),
            category: None,
            min_stock: 0.0,
            max_stock: 100.0,
            cost_price: 1.0,
            is_active: true,
            created_at: created,
            updated_at: created,
        }
    }

    pub fn item(id: &str, product_id: &str, expected: f64) -> CountItem {
        CountItem {
            id: id.to_string(),
            sector_count_id: "sc-1".into(),
            product_id: product_id.to_string(),
            expected_quantity: expected,
            counted_quantity: None,
            difference: None,
            observations: None,
            is_counted: false,
            counted_at: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            product: Some(product(product_id)),
        }
    }

    pub fn items(expected: &[f64]) -> Vec<CountItem> {
        expected
            .iter()
            .enumerate()
            .map(|(i, &qty)| item(&format!("i{i}"), &format!("p{i}"), qty))
            .collect()
    }

    pub fn sector_count() -> SectorCount {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        SectorCount {
            id: "sc-1".into(),
            inventory_count_id: "ic-1".into(),
            sector_id: "s-1".into(),
            employee_name: Some("Dana".into()),
            employee_id: Some("e-1".into()),
            status: SectorCountStatus::Pending,
            started_at: None,
            completed_at: None,
            total_products: 0,
            counted_products: 0,
            created_at: created,
            sector: Some(Sector {
                id: "s-1".into(),
                company_id: "acme".into(),
                name: "Cold storage".into(),
                description: None,
                is_active: true,
                created_at: created,
            }),
            count_items: Vec::new(),
        }
    }
}
