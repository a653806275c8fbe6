//! One product-expectation pairing inside a sector count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Product;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountItem {
    pub id: String,
    pub sector_count_id: String,
    pub product_id: String,
    pub expected_quantity: f64,
    pub counted_quantity: Option<f64>,
    /// `counted_quantity - expected_quantity`; present iff `counted_quantity` is.
    pub difference: Option<f64>,
    pub observations: Option<String>,
    #[serde(default)]
    pub is_counted: bool,
    pub counted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub product: Option<Product>,
}

impl CountItem {
    /// Record a counted quantity and keep `difference` in step with it.
    pub fn record_count(
        &mut self,
        quantity: f64,
        observations: Option<String>,
        counted_at: DateTime<Utc>,
    ) {
        self.counted_quantity = Some(quantity);
        self.difference = Some(quantity - self.expected_quantity);
        self.observations = observations;
        self.is_counted = true;
        self.counted_at = Some(counted_at);
    }

    pub fn product_code(&self) -> &str {
        self.product.as_ref().map(|p| p.code.as_str()).unwrap_or("")
    }

    pub fn product_name(&self) -> &str {
        self.product.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }
}
