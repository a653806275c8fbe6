use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{collect_discrepancies, CountDiscrepancy, CountingProgress};
use crate::models::SectorCount;

/// Produced once, when the session completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountingSummary {
    pub sector_name: String,
    pub employee_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_products: usize,
    pub counted_products: usize,
    /// Skipped and not-found items together.
    pub skipped_products: usize,
    pub not_found_products: usize,
    pub discrepancies: Vec<CountDiscrepancy>,
    pub observations: Vec<String>,
}

impl CountingSummary {
    pub fn build(
        sector_count: &SectorCount,
        progress: &CountingProgress,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let observations = sector_count
            .count_items
            .iter()
            .filter_map(|item| {
                let text = item.observations.as_deref()?.trim();
                if text.is_empty() {
                    return None;
                }
                Some(match item.product_code() {
                    "" => text.to_string(),
                    code => format!("{code}: {text}"),
                })
            })
            .collect();

        Self {
            sector_name: sector_count.sector_name().to_string(),
            employee_name: sector_count.employee_name().to_string(),
            start_time,
            end_time,
            total_products: progress.total,
            counted_products: progress.counted,
            skipped_products: progress.skipped + progress.not_found,
            not_found_products: progress.not_found,
            discrepancies: collect_discrepancies(&sector_count.count_items),
            observations,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end_time.signed_duration_since(self.start_time)
    }

    pub fn large_discrepancies(&self, ratio: f64) -> impl Iterator<Item = &CountDiscrepancy> {
        self.discrepancies.iter().filter(move |d| d.is_large(ratio))
    }
}
