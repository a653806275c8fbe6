//! The aggregate a worker walks through during a count.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CountItem, Sector};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum SectorCountStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl SectorCountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectorCountStatus::Pending => "pending",
            SectorCountStatus::InProgress => "in_progress",
            SectorCountStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "pending" => Ok(SectorCountStatus::Pending),
            "in_progress" => Ok(SectorCountStatus::InProgress),
            "completed" => Ok(SectorCountStatus::Completed),
            other => Err(anyhow!("unknown sector count status {other}")),
        }
    }
}

impl TryFrom<String> for SectorCountStatus {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectorCount {
    pub id: String,
    pub inventory_count_id: String,
    pub sector_id: String,
    pub employee_name: Option<String>,
    pub employee_id: Option<String>,
    #[serde(default)]
    pub status: SectorCountStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_products: usize,
    #[serde(default)]
    pub counted_products: usize,
    pub created_at: DateTime<Utc>,
    pub sector: Option<Sector>,
    /// Iteration order for the session; owned exclusively by this count.
    #[serde(default)]
    pub count_items: Vec<CountItem>,
}

impl SectorCount {
    pub fn sector_name(&self) -> &str {
        self.sector
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("Unknown")
    }

    pub fn employee_name(&self) -> &str {
        self.employee_name.as_deref().unwrap_or("Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_wire_name() {
        for status in [
            SectorCountStatus::Pending,
            SectorCountStatus::InProgress,
            SectorCountStatus::Completed,
        ] {
            assert_eq!(SectorCountStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(SectorCountStatus::parse("draft").is_err());
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&SectorCountStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
