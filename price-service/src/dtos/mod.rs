pub mod prices;
pub mod pricing_rules;

pub use prices::{CalculatePricesRequest, CalculatePricesResponse};
pub use pricing_rules::{
    CreatePricingRuleRequest, ListPricingRulesQuery, PricingRuleListResponse, PricingRuleResponse,
    UpdatePricingRuleRequest,
};
