//! In-memory rule store for tests and database-less deployments.

use crate::models::{NewPricingRule, PricingRule, PricingRuleFilter, RuleDraft};
use crate::services::error::{RuleKey, StoreError};
use crate::services::store::PricingRuleStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    next_id: i64,
    rules: BTreeMap<i64, PricingRule>,
}

impl Inner {
    fn find_pair(&self, company_id: i64, service_id: i64) -> Option<&PricingRule> {
        self.rules
            .values()
            .find(|r| r.company_id == company_id && r.service_id == service_id)
    }
}

/// Mutex-guarded map of rules. The duplicate check and the insert happen
/// under one lock acquisition.
#[derive(Default)]
pub struct InMemoryPricingRuleStore {
    inner: Mutex<Inner>,
}

impl InMemoryPricingRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Internal(anyhow::anyhow!("rule store lock poisoned")))
    }
}

#[async_trait]
impl PricingRuleStore for InMemoryPricingRuleStore {
    async fn create(&self, rule: &NewPricingRule) -> Result<PricingRule, StoreError> {
        let mut inner = self.lock()?;

        if inner.find_pair(rule.company_id, rule.service_id).is_some() {
            return Err(StoreError::Duplicate {
                company_id: rule.company_id,
                service_id: rule.service_id,
            });
        }

        inner.next_id += 1;
        let now = Utc::now();
        let created = PricingRule {
            id: inner.next_id,
            company_id: rule.company_id,
            service_id: rule.service_id,
            base_price: rule.draft.base_price,
            currency: rule.draft.currency.clone(),
            pricing: rule.draft.pricing.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.rules.insert(created.id, created.clone());

        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> Result<PricingRule, StoreError> {
        self.lock()?
            .rules
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(RuleKey::Id(id)))
    }

    async fn get_by_company_and_service(
        &self,
        company_id: i64,
        service_id: i64,
    ) -> Result<PricingRule, StoreError> {
        self.lock()?
            .find_pair(company_id, service_id)
            .cloned()
            .ok_or(StoreError::NotFound(RuleKey::CompanyService {
                company_id,
                service_id,
            }))
    }

    async fn get_batch_by_company_and_services(
        &self,
        company_id: i64,
        service_ids: &[i64],
    ) -> Result<HashMap<i64, PricingRule>, StoreError> {
        if service_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let inner = self.lock()?;
        Ok(inner
            .rules
            .values()
            .filter(|r| r.company_id == company_id && service_ids.contains(&r.service_id))
            .map(|r| (r.service_id, r.clone()))
            .collect())
    }

    async fn list(&self, filter: &PricingRuleFilter) -> Result<Vec<PricingRule>, StoreError> {
        let inner = self.lock()?;
        let mut rules: Vec<PricingRule> = inner
            .rules
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rules.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rules)
    }

    async fn update(&self, id: i64, draft: &RuleDraft) -> Result<PricingRule, StoreError> {
        let mut inner = self.lock()?;
        let rule = inner
            .rules
            .get_mut(&id)
            .ok_or(StoreError::NotFound(RuleKey::Id(id)))?;

        rule.base_price = draft.base_price;
        rule.currency = draft.currency.clone();
        rule.pricing = draft.pricing.clone();
        rule.updated_at = Utc::now();

        Ok(rule.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.lock()?
            .rules
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(RuleKey::Id(id)))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}
