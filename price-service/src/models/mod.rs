//! Domain models for price-service.

mod price;
mod pricing_rule;
mod vehicle;

pub use price::CalculatedPrice;
pub use pricing_rule::{
    ClassTable, CreatePricingRule, NewPricingRule, Pricing, PricingRule, PricingRuleFilter,
    PricingRulePatch, PricingType, RuleDraft,
};
pub use vehicle::{is_standard_code, VehicleClass, STANDARD_VEHICLE_CLASSES};
