use crate::models::{
    ClassTable, CreatePricingRule, PricingRule, PricingRuleFilter, PricingRulePatch,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_currency() -> String {
    "RUB".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePricingRuleRequest {
    #[validate(range(min = 1, message = "company_id must be positive"))]
    pub company_id: i64,
    #[validate(range(min = 1, message = "service_id must be positive"))]
    pub service_id: i64,
    pub pricing_type: String,
    pub base_price: Option<Decimal>,
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
    pub vehicle_class_multipliers: Option<ClassTable>,
    pub vehicle_class_prices: Option<ClassTable>,
}

impl From<CreatePricingRuleRequest> for CreatePricingRule {
    fn from(req: CreatePricingRuleRequest) -> Self {
        Self {
            company_id: req.company_id,
            service_id: req.service_id,
            pricing_type: req.pricing_type,
            base_price: req.base_price,
            currency: req.currency,
            vehicle_class_multipliers: req.vehicle_class_multipliers,
            vehicle_class_prices: req.vehicle_class_prices,
        }
    }
}

/// Partial update. Omitted fields keep their value; `{}` clears a class table.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePricingRuleRequest {
    pub pricing_type: Option<String>,
    pub base_price: Option<Decimal>,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: Option<String>,
    pub vehicle_class_multipliers: Option<ClassTable>,
    pub vehicle_class_prices: Option<ClassTable>,
}

impl From<UpdatePricingRuleRequest> for PricingRulePatch {
    fn from(req: UpdatePricingRuleRequest) -> Self {
        Self {
            pricing_type: req.pricing_type,
            base_price: req.base_price,
            currency: req.currency,
            vehicle_class_multipliers: req.vehicle_class_multipliers,
            vehicle_class_prices: req.vehicle_class_prices,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPricingRulesQuery {
    pub company_id: Option<i64>,
    pub service_id: Option<i64>,
}

impl From<ListPricingRulesQuery> for PricingRuleFilter {
    fn from(query: ListPricingRulesQuery) -> Self {
        Self {
            company_id: query.company_id,
            service_id: query.service_id,
        }
    }
}

/// Flat wire form of a rule. Only the table belonging to the variant is emitted.
#[derive(Debug, Serialize)]
pub struct PricingRuleResponse {
    pub id: i64,
    pub company_id: i64,
    pub service_id: i64,
    pub pricing_type: String,
    pub base_price: Decimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_class_multipliers: Option<ClassTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_class_prices: Option<ClassTable>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PricingRule> for PricingRuleResponse {
    fn from(rule: PricingRule) -> Self {
        Self {
            id: rule.id,
            company_id: rule.company_id,
            service_id: rule.service_id,
            pricing_type: rule.pricing.tag().to_string(),
            base_price: rule.base_price,
            currency: rule.currency,
            vehicle_class_multipliers: rule.pricing.multipliers().cloned(),
            vehicle_class_prices: rule.pricing.class_prices().cloned(),
            created_at: rule.created_at,
            updated_at: rule.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PricingRuleListResponse {
    pub rules: Vec<PricingRuleResponse>,
}

impl From<Vec<PricingRule>> for PricingRuleListResponse {
    fn from(rules: Vec<PricingRule>) -> Self {
        Self {
            rules: rules.into_iter().map(PricingRuleResponse::from).collect(),
        }
    }
}
