//! Price calculation for a single rule.
//!
//! The calculator never fails: when a rule lacks the data for the requested
//! vehicle class it falls back to the base price and returns a
//! [`PriceAdvisory`] next to the result.

use crate::models::{CalculatedPrice, ClassTable, Pricing, PricingRule, VehicleClass};
use rust_decimal::Decimal;
use thiserror::Error;

/// Recoverable condition attached to a fallback price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceAdvisory {
    #[error("multiplier not found for vehicle class '{vehicle_class}'")]
    MultiplierNotFound { vehicle_class: String },

    #[error("fixed price not found for vehicle class '{vehicle_class}'")]
    FixedPriceNotFound { vehicle_class: String },

    #[error("invalid pricing rule type '{pricing_type}'")]
    InvalidPricingRule { pricing_type: String },

    #[error("price for vehicle class '{vehicle_class}' is out of range")]
    PriceOverflow { vehicle_class: String },
}

impl PriceAdvisory {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PriceAdvisory::MultiplierNotFound { .. } => "multiplier_not_found",
            PriceAdvisory::FixedPriceNotFound { .. } => "fixed_price_not_found",
            PriceAdvisory::InvalidPricingRule { .. } => "invalid_pricing_rule",
            PriceAdvisory::PriceOverflow { .. } => "price_overflow",
        }
    }
}

/// Compute the price `rule` yields for `vehicle_class`.
pub fn calculate_price(
    rule: &PricingRule,
    vehicle_class: Option<&VehicleClass>,
) -> (CalculatedPrice, Option<PriceAdvisory>) {
    let mut result = CalculatedPrice {
        company_id: rule.company_id,
        service_id: rule.service_id,
        price: rule.base_price,
        currency: rule.currency.clone(),
        pricing_type: rule.pricing.tag().to_string(),
        vehicle_class: None,
    };

    let advisory = match &rule.pricing {
        Pricing::Static => None,
        Pricing::VehicleClassMultiplier(multipliers) => vehicle_class.and_then(|class| {
            result.vehicle_class = Some(class.to_string());
            match lookup(multipliers, class) {
                Some(multiplier) => match rule.base_price.checked_mul(multiplier) {
                    Some(price) => {
                        result.price = price;
                        None
                    }
                    None => Some(PriceAdvisory::PriceOverflow {
                        vehicle_class: class.to_string(),
                    }),
                },
                None => Some(PriceAdvisory::MultiplierNotFound {
                    vehicle_class: class.to_string(),
                }),
            }
        }),
        Pricing::VehicleClassFixed(prices) => vehicle_class.and_then(|class| {
            result.vehicle_class = Some(class.to_string());
            match lookup(prices, class) {
                Some(price) => {
                    result.price = price;
                    None
                }
                None => Some(PriceAdvisory::FixedPriceNotFound {
                    vehicle_class: class.to_string(),
                }),
            }
        }),
        Pricing::Unrecognized(tag) => Some(PriceAdvisory::InvalidPricingRule {
            pricing_type: tag.clone(),
        }),
    };

    (result, advisory)
}

fn lookup(table: &ClassTable, class: &VehicleClass) -> Option<Decimal> {
    table.get(class.as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn table(entries: &[(&str, &str)]) -> ClassTable {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), dec(v)))
            .collect()
    }

    fn rule(base_price: &str, pricing: Pricing) -> PricingRule {
        let now = Utc::now();
        PricingRule {
            id: 1,
            company_id: 7,
            service_id: 42,
            base_price: dec(base_price),
            currency: "RUB".to_string(),
            pricing,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_static_ignores_vehicle_class() {
        let rule = rule("1500.00", Pricing::Static);
        for class in [None, Some(VehicleClass::from("C")), Some(VehicleClass::from("Z"))] {
            let (price, advisory) = calculate_price(&rule, class.as_ref());
            assert_eq!(price.price, dec("1500.00"));
            assert_eq!(price.vehicle_class, None);
            assert_eq!(price.pricing_type, "static");
            assert!(advisory.is_none());
        }
    }

    #[test]
    fn test_multiplier_applies_to_base_price() {
        let rule = rule(
            "1500.00",
            Pricing::VehicleClassMultiplier(table(&[("C", "1.5"), ("E", "2.0")])),
        );
        let (price, advisory) = calculate_price(&rule, Some(&VehicleClass::from("C")));
        assert_eq!(price.price, dec("2250"));
        assert_eq!(price.vehicle_class.as_deref(), Some("C"));
        assert_eq!(price.company_id, 7);
        assert_eq!(price.service_id, 42);
        assert!(advisory.is_none());
    }

    #[test]
    fn test_multiplier_missing_class_falls_back_with_advisory() {
        let rule = rule("1000", Pricing::VehicleClassMultiplier(table(&[("C", "1.5")])));
        let (price, advisory) = calculate_price(&rule, Some(&VehicleClass::from("M")));
        assert_eq!(price.price, dec("1000"));
        assert_eq!(price.vehicle_class.as_deref(), Some("M"));
        assert_eq!(
            advisory,
            Some(PriceAdvisory::MultiplierNotFound {
                vehicle_class: "M".to_string()
            })
        );
    }

    #[test]
    fn test_multiplier_without_vehicle_uses_base_price() {
        let rule = rule("1000", Pricing::VehicleClassMultiplier(table(&[("C", "1.5")])));
        let (price, advisory) = calculate_price(&rule, None);
        assert_eq!(price.price, dec("1000"));
        assert_eq!(price.vehicle_class, None);
        assert!(advisory.is_none());
    }

    #[test]
    fn test_fixed_price_lookup() {
        let rule = rule(
            "1000",
            Pricing::VehicleClassFixed(table(&[("A", "800.50"), ("J", "1800")])),
        );

        let (price, advisory) = calculate_price(&rule, Some(&VehicleClass::from("A")));
        assert_eq!(price.price, dec("800.50"));
        assert_eq!(price.pricing_type, "vehicle_class_fixed");
        assert!(advisory.is_none());

        let (price, advisory) = calculate_price(&rule, Some(&VehicleClass::from("S")));
        assert_eq!(price.price, dec("1000"));
        assert_eq!(price.vehicle_class.as_deref(), Some("S"));
        assert_eq!(advisory.map(|a| a.kind()), Some("fixed_price_not_found"));

        let (price, advisory) = calculate_price(&rule, None);
        assert_eq!(price.price, dec("1000"));
        assert_eq!(price.vehicle_class, None);
        assert!(advisory.is_none());
    }

    #[test]
    fn test_unrecognized_type_falls_back() {
        let rule = rule("99.99", Pricing::Unrecognized("tiered".to_string()));
        let (price, advisory) = calculate_price(&rule, Some(&VehicleClass::from("C")));
        assert_eq!(price.price, dec("99.99"));
        assert_eq!(price.pricing_type, "tiered");
        assert_eq!(price.vehicle_class, None);
        assert_eq!(
            advisory,
            Some(PriceAdvisory::InvalidPricingRule {
                pricing_type: "tiered".to_string()
            })
        );
    }

    #[test]
    fn test_overflowing_multiplier_keeps_base_price() {
        let rule = rule(
            "79228162514264337593543950335",
            Pricing::VehicleClassMultiplier(table(&[("F", "10")])),
        );
        let (price, advisory) = calculate_price(&rule, Some(&VehicleClass::from("F")));
        assert_eq!(price.price, Decimal::MAX);
        assert_eq!(advisory.map(|a| a.kind()), Some("price_overflow"));
    }
}
