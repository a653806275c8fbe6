//! Where a counting session and its items come from before `initialize`.

use std::{fs, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    log_warn,
    models::{CountItem, Product, Sector, SectorCount, SectorCountStatus},
};

const ENABLE_LOGS: bool = true;

/// Supplies the session aggregate and its ordered items.
///
/// Without an id the source picks its own session.
pub trait SessionSource {
    fn load(&self, sector_count_id: Option<&str>) -> Result<(SectorCount, Vec<CountItem>)>;
}

/// Generates a throwaway session with random expectations, for demos and manual runs.
pub struct StubSessionSource {
    item_count: usize,
    employee_name: String,
}

impl StubSessionSource {
    pub fn new(item_count: usize, employee_name: impl Into<String>) -> Self {
        Self {
            item_count,
            employee_name: employee_name.into(),
        }
    }
}

impl SessionSource for StubSessionSource {
    fn load(&self, sector_count_id: Option<&str>) -> Result<(SectorCount, Vec<CountItem>)> {
        let sector_count_id = sector_count_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let sector_count_id = sector_count_id.as_str();
        let now = Utc::now();
        let mut rng = rand::thread_rng();
        let company_id = "demo-company".to_string();
        let sector_id = Uuid::new_v4().to_string();

        let items = (0..self.item_count)
            .map(|n| {
                let product_id = Uuid::new_v4().to_string();
                CountItem {
                    id: Uuid::new_v4().to_string(),
                    sector_count_id: sector_count_id.to_string(),
                    product_id: product_id.clone(),
                    expected_quantity: rng.gen_range(10..60) as f64,
                    counted_quantity: None,
                    difference: None,
                    observations: None,
                    is_counted: false,
                    counted_at: None,
                    created_at: now,
                    product: Some(Product {
                        id: product_id,
                        company_id: company_id.clone(),
                        code: format!("PRD{:03}", n + 1),
                        name: format!("Product {}", n + 1),
                        description: None,
                        unit_measure: Some("UN".into()),
                        category: None,
                        min_stock: 0.0,
                        max_stock: 0.0,
                        cost_price: 0.0,
                        is_active: true,
                        created_at: now,
                        updated_at: now,
                    }),
                }
            })
            .collect::<Vec<_>>();

        let sector_count = SectorCount {
            id: sector_count_id.to_string(),
            inventory_count_id: Uuid::new_v4().to_string(),
            sector_id: sector_id.clone(),
            employee_name: Some(self.employee_name.clone()),
            employee_id: None,
            status: SectorCountStatus::Pending,
            started_at: None,
            completed_at: None,
            total_products: items.len(),
            counted_products: 0,
            created_at: now,
            sector: Some(Sector {
                id: sector_id,
                company_id,
                name: "Demo sector".into(),
                description: None,
                is_active: true,
                created_at: now,
            }),
            count_items: Vec::new(),
        };

        Ok((sector_count, items))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Fixture {
    Many(Vec<SectorCount>),
    One(SectorCount),
}

/// Reads sector counts (one object or an array) from a JSON file.
pub struct JsonSessionSource {
    path: PathBuf,
}

impl JsonSessionSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionSource for JsonSessionSource {
    fn load(&self, sector_count_id: Option<&str>) -> Result<(SectorCount, Vec<CountItem>)> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session fixture {}", self.path.display()))?;
        let fixture: Fixture = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid session fixture {}", self.path.display()))?;

        let mut sector_count = match (fixture, sector_count_id) {
            (Fixture::One(sector_count), requested) => {
                if let Some(requested) = requested.filter(|id| *id != sector_count.id) {
                    log_warn!(
                        "Requested sector count {} but {} holds only {}; using it",
                        requested,
                        self.path.display(),
                        sector_count.id
                    );
                }
                sector_count
            }
            (Fixture::Many(counts), Some(requested)) => counts
                .into_iter()
                .find(|sc| sc.id == requested)
                .ok_or_else(|| anyhow!("sector count {requested} not found"))?,
            (Fixture::Many(counts), None) => counts
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("{} holds no sector counts", self.path.display()))?,
        };

        let items = std::mem::take(&mut sector_count.count_items);
        Ok((sector_count, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_generates_requested_items_with_expectations_in_range() {
        let (sector_count, items) = StubSessionSource::new(4, "Dana").load(Some("sc-9")).unwrap();

        assert_eq!(sector_count.id, "sc-9");
        assert_eq!(sector_count.employee_name(), "Dana");
        assert_eq!(items.len(), 4);
        for item in &items {
            assert!((10.0..60.0).contains(&item.expected_quantity));
            assert_eq!(item.sector_count_id, "sc-9");
            assert!(!item.is_counted);
        }
    }

    #[test]
    fn json_fixture_selects_matching_sector_count() {
        let path = std::env::temp_dir().join(format!("inventory-count-{}.json", Uuid::new_v4()));
        let fixture = r#"[
            {"id":"a","inventoryCountId":"ic","sectorId":"s","createdAt":"2024-03-01T08:00:00Z",
             "countItems":[]},
            {"id":"b","inventoryCountId":"ic","sectorId":"s","status":"pending",
             "createdAt":"2024-03-01T08:00:00Z",
             "countItems":[{"id":"i1","sectorCountId":"b","productId":"p1",
                            "expectedQuantity":12.0,"createdAt":"2024-03-01T08:00:00Z"}]}
        ]"#;
        fs::write(&path, fixture).unwrap();

        let source = JsonSessionSource::new(path.clone());
        let (sector_count, items) = source.load(Some("b")).unwrap();
        assert_eq!(sector_count.id, "b");
        assert!(sector_count.count_items.is_empty());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].expected_quantity, 12.0);

        assert!(source.load(Some("zzz")).is_err());

        let (first, _) = source.load(None).unwrap();
        assert_eq!(first.id, "a");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn single_object_fixture_is_used_whatever_id_is_requested() {
        let path = std::env::temp_dir().join(format!("inventory-count-{}.json", Uuid::new_v4()));
        let fixture = r#"{"id":"only","inventoryCountId":"ic","sectorId":"s",
            "status":"in_progress","createdAt":"2024-03-01T08:00:00Z"}"#;
        fs::write(&path, fixture).unwrap();

        let source = JsonSessionSource::new(path.clone());
        let (sector_count, items) = source.load(Some("other")).unwrap();
        assert_eq!(sector_count.id, "only");
        assert_eq!(sector_count.status, SectorCountStatus::InProgress);
        assert!(items.is_empty());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_status_in_fixture_is_rejected() {
        let path = std::env::temp_dir().join(format!("inventory-count-{}.json", Uuid::new_v4()));
        let fixture = r#"{"id":"x","inventoryCountId":"ic","sectorId":"s",
            "status":"draft","createdAt":"2024-03-01T08:00:00Z"}"#;
        fs::write(&path, fixture).unwrap();

        let err = JsonSessionSource::new(path.clone()).load(None).unwrap_err();
        assert!(format!("{err:#}").contains("unknown sector count status draft"));
        let _ = fs::remove_file(path);
    }
}
