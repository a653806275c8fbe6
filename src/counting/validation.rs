//! Caller-side checks run before a quantity reaches the session manager.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CountValidation {
    pub is_valid: bool,
    pub quantity: Option<f64>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Accepts a decimal comma ("12,5") as well as a decimal point.
pub fn parse_quantity(input: &str) -> Result<f64> {
    let normalized = input.trim().replace(',', ".");
    if normalized.is_empty() {
        return Err(anyhow!("quantity is empty"));
    }
    let value: f64 = normalized
        .parse()
        .with_context(|| format!("'{}' is not a number", input.trim()))?;
    if !value.is_finite() {
        return Err(anyhow!("'{}' is not a finite number", input.trim()));
    }
    Ok(value)
}

pub fn validate_quantity(input: &str, expected: f64, large_difference_ratio: f64) -> CountValidation {
    let mut validation = CountValidation::default();

    match parse_quantity(input) {
        Ok(value) if value < 0.0 => {
            validation.errors.push("quantity cannot be negative".to_string());
        }
        Ok(value) => {
            let difference = value - expected;
            if difference.abs() > expected * large_difference_ratio {
                validation.warnings.push(format!(
                    "difference of {difference} exceeds {:.0}% of the expected {expected}",
                    large_difference_ratio * 100.0
                ));
            }
            validation.quantity = Some(value);
        }
        Err(err) => validation.errors.push(err.to_string()),
    }

    validation.is_valid = validation.errors.is_empty();
    validation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_comma_is_accepted() {
        assert_eq!(parse_quantity(" 12,5 ").unwrap(), 12.5);
        assert_eq!(parse_quantity("7").unwrap(), 7.0);
    }

    #[test]
    fn garbage_and_blank_input_are_rejected() {
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("abc").is_err());
        assert!(parse_quantity("inf").is_err());
    }

    #[test]
    fn negative_quantity_is_an_error() {
        let validation = validate_quantity("-3", 10.0, 0.2);
        assert!(!validation.is_valid);
        assert_eq!(validation.quantity, None);
        assert_eq!(validation.errors.len(), 1);
    }

    #[test]
    fn large_difference_is_only_a_warning() {
        let validation = validate_quantity("13", 10.0, 0.2);
        assert!(validation.is_valid);
        assert_eq!(validation.quantity, Some(13.0));
        assert_eq!(validation.warnings.len(), 1);

        let close = validate_quantity("11", 10.0, 0.2);
        assert!(close.warnings.is_empty());
    }
}
