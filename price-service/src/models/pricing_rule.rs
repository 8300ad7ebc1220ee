//! Pricing rule model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Vehicle class code → multiplier or absolute price.
pub type ClassTable = BTreeMap<String, Decimal>;

/// Pricing variant tag as it appears on the wire and in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    Static,
    VehicleClassMultiplier,
    VehicleClassFixed,
}

impl PricingType {
    pub const ALL: [PricingType; 3] = [
        PricingType::Static,
        PricingType::VehicleClassMultiplier,
        PricingType::VehicleClassFixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PricingType::Static => "static",
            PricingType::VehicleClassMultiplier => "vehicle_class_multiplier",
            PricingType::VehicleClassFixed => "vehicle_class_fixed",
        }
    }

    /// Parse a wire tag. Unknown tags yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for PricingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule turns a vehicle class into a price.
///
/// Validated writes only ever produce the first three variants, each carrying
/// exactly the table it needs. `Unrecognized` exists for rows read back from
/// storage whose tag this build does not know; the calculator prices those at
/// base price and reports them.
#[derive(Debug, Clone, PartialEq)]
pub enum Pricing {
    Static,
    VehicleClassMultiplier(ClassTable),
    VehicleClassFixed(ClassTable),
    Unrecognized(String),
}

impl Pricing {
    /// Rebuild the variant from the flat storage representation.
    ///
    /// Only the table relevant to the tag is kept.
    pub fn from_parts(pricing_type: &str, multipliers: ClassTable, prices: ClassTable) -> Self {
        match PricingType::parse(pricing_type) {
            Some(PricingType::Static) => Pricing::Static,
            Some(PricingType::VehicleClassMultiplier) => Pricing::VehicleClassMultiplier(multipliers),
            Some(PricingType::VehicleClassFixed) => Pricing::VehicleClassFixed(prices),
            None => Pricing::Unrecognized(pricing_type.to_string()),
        }
    }

    pub fn pricing_type(&self) -> Option<PricingType> {
        match self {
            Pricing::Static => Some(PricingType::Static),
            Pricing::VehicleClassMultiplier(_) => Some(PricingType::VehicleClassMultiplier),
            Pricing::VehicleClassFixed(_) => Some(PricingType::VehicleClassFixed),
            Pricing::Unrecognized(_) => None,
        }
    }

    /// The wire tag, including an unrecognized one verbatim.
    pub fn tag(&self) -> &str {
        match self {
            Pricing::Unrecognized(tag) => tag,
            known => known.pricing_type().map(|t| t.as_str()).unwrap_or_default(),
        }
    }

    /// Whether pricing depends on the user's vehicle class.
    pub fn requires_vehicle_class(&self) -> bool {
        matches!(
            self,
            Pricing::VehicleClassMultiplier(_) | Pricing::VehicleClassFixed(_)
        )
    }

    pub fn multipliers(&self) -> Option<&ClassTable> {
        match self {
            Pricing::VehicleClassMultiplier(table) => Some(table),
            _ => None,
        }
    }

    pub fn class_prices(&self) -> Option<&ClassTable> {
        match self {
            Pricing::VehicleClassFixed(table) => Some(table),
            _ => None,
        }
    }
}

/// Persisted pricing rule: how one company prices one service.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingRule {
    pub id: i64,
    pub company_id: i64,
    pub service_id: i64,
    pub base_price: Decimal,
    pub currency: String,
    pub pricing: Pricing,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw create input, before validation.
#[derive(Debug, Clone, Default)]
pub struct CreatePricingRule {
    pub company_id: i64,
    pub service_id: i64,
    pub pricing_type: String,
    pub base_price: Option<Decimal>,
    pub currency: String,
    pub vehicle_class_multipliers: Option<ClassTable>,
    pub vehicle_class_prices: Option<ClassTable>,
}

/// Raw partial update. `None` keeps the current value; `Some(empty)` clears a table.
#[derive(Debug, Clone, Default)]
pub struct PricingRulePatch {
    pub pricing_type: Option<String>,
    pub base_price: Option<Decimal>,
    pub currency: Option<String>,
    pub vehicle_class_multipliers: Option<ClassTable>,
    pub vehicle_class_prices: Option<ClassTable>,
}

/// The variant-bearing part of a rule after validation.
///
/// Only the validator builds these, so every draft satisfies the
/// field/variant co-occurrence rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft {
    pub base_price: Decimal,
    pub currency: String,
    pub pricing: Pricing,
}

/// A validated rule ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPricingRule {
    pub company_id: i64,
    pub service_id: i64,
    pub draft: RuleDraft,
}

/// Filter parameters for listing rules.
#[derive(Debug, Clone, Default)]
pub struct PricingRuleFilter {
    pub company_id: Option<i64>,
    pub service_id: Option<i64>,
}

impl PricingRuleFilter {
    pub fn matches(&self, rule: &PricingRule) -> bool {
        self.company_id.is_none_or(|id| id == rule.company_id)
            && self.service_id.is_none_or(|id| id == rule.service_id)
    }
}
