//! Pricing rule management: validated writes through the rule store.

use crate::models::{CreatePricingRule, PricingRule, PricingRuleFilter, PricingRulePatch};
use crate::services::error::PricingError;
use crate::services::metrics::record_rule_operation;
use crate::services::store::PricingRuleStore;
use crate::services::validator::{validate_for_create, validate_for_update};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct PricingRuleService {
    store: Arc<dyn PricingRuleStore>,
}

impl PricingRuleService {
    pub fn new(store: Arc<dyn PricingRuleStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), fields(company_id = input.company_id, service_id = input.service_id))]
    pub async fn create(&self, input: &CreatePricingRule) -> Result<PricingRule, PricingError> {
        let result = self.create_inner(input).await;
        track("create", &result);
        result
    }

    async fn create_inner(&self, input: &CreatePricingRule) -> Result<PricingRule, PricingError> {
        let new_rule = validate_for_create(input).inspect_err(|e| {
            warn!(field = %e.field(), error = %e, "Rejected pricing rule");
        })?;

        let rule = self.store.create(&new_rule).await?;
        info!(rule_id = rule.id, pricing_type = rule.pricing.tag(), "Pricing rule created");
        Ok(rule)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<PricingRule, PricingError> {
        let result = self.store.get_by_id(id).await.map_err(PricingError::from);
        track("get", &result);
        result
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: &PricingRuleFilter) -> Result<Vec<PricingRule>, PricingError> {
        let result = self.store.list(filter).await.map_err(PricingError::from);
        track("list", &result);
        result
    }

    /// Apply `patch` to rule `id`. The merged rule is validated as a whole.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: i64,
        patch: &PricingRulePatch,
    ) -> Result<PricingRule, PricingError> {
        let result = self.update_inner(id, patch).await;
        track("update", &result);
        result
    }

    async fn update_inner(
        &self,
        id: i64,
        patch: &PricingRulePatch,
    ) -> Result<PricingRule, PricingError> {
        let current = self.store.get_by_id(id).await?;

        let draft = validate_for_update(&current, patch).inspect_err(|e| {
            warn!(field = %e.field(), error = %e, "Rejected pricing rule update");
        })?;

        let rule = self.store.update(id, &draft).await?;
        info!(rule_id = rule.id, pricing_type = rule.pricing.tag(), "Pricing rule updated");
        Ok(rule)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), PricingError> {
        let result = self.store.delete(id).await.map_err(PricingError::from);
        if result.is_ok() {
            info!(rule_id = id, "Pricing rule deleted");
        }
        track("delete", &result);
        result
    }
}

fn track<T>(operation: &str, result: &Result<T, PricingError>) {
    let status = match result {
        Ok(_) => "success",
        Err(PricingError::Validation(_)) => "invalid",
        Err(PricingError::NotFound(_)) => "not_found",
        Err(PricingError::DuplicateRule { .. }) => "duplicate",
        Err(PricingError::Internal(_)) => "error",
    };
    record_rule_operation(operation, status);
}
