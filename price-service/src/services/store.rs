//! Rule store contract.

use crate::models::{NewPricingRule, PricingRule, PricingRuleFilter, RuleDraft};
use crate::services::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Persistence for pricing rules.
///
/// Implementations own the `(company_id, service_id)` uniqueness guarantee:
/// concurrent creates for one pair yield one rule and one
/// [`StoreError::Duplicate`].
#[async_trait]
pub trait PricingRuleStore: Send + Sync {
    async fn create(&self, rule: &NewPricingRule) -> Result<PricingRule, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<PricingRule, StoreError>;

    async fn get_by_company_and_service(
        &self,
        company_id: i64,
        service_id: i64,
    ) -> Result<PricingRule, StoreError>;

    /// Rules for `company_id` keyed by service id. Services without a rule
    /// have no entry; an empty `service_ids` returns an empty map.
    async fn get_batch_by_company_and_services(
        &self,
        company_id: i64,
        service_ids: &[i64],
    ) -> Result<HashMap<i64, PricingRule>, StoreError>;

    /// Rules matching `filter`, newest first.
    async fn list(&self, filter: &PricingRuleFilter) -> Result<Vec<PricingRule>, StoreError>;

    /// Replace the mutable part of rule `id` with `draft` and refresh `updated_at`.
    async fn update(&self, id: i64, draft: &RuleDraft) -> Result<PricingRule, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
