//! Catalog records referenced by count sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A physical or organizational area of a client's facility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub company_id: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_measure: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub min_stock: f64,
    #[serde(default)]
    pub max_stock: f64,
    #[serde(default)]
    pub cost_price: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
