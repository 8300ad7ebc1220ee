//! Price calculation orchestration.
//!
//! Every request runs in two phases. First the rules are resolved and the
//! vehicle class is fetched at most once, and only when some resolved rule
//! depends on it. Then each rule is priced against that single class.

use crate::models::{CalculatedPrice, PricingRule, VehicleClass};
use crate::services::calculator::calculate_price;
use crate::services::error::{PricingError, StoreError};
use crate::services::metrics::{
    record_price_advisory, record_price_calculation, record_vehicle_lookup,
};
use crate::services::store::PricingRuleStore;
use crate::services::vehicle_profile::{GatewayError, VehicleProfileGateway};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[derive(Clone)]
pub struct PriceOrchestrator {
    rules: Arc<dyn PricingRuleStore>,
    vehicles: Arc<dyn VehicleProfileGateway>,
}

impl PriceOrchestrator {
    pub fn new(rules: Arc<dyn PricingRuleStore>, vehicles: Arc<dyn VehicleProfileGateway>) -> Self {
        Self { rules, vehicles }
    }

    /// Price one service of `company_id`.
    #[instrument(skip(self))]
    pub async fn calculate(
        &self,
        user_id: Option<i64>,
        company_id: i64,
        service_id: i64,
    ) -> Result<CalculatedPrice, PricingError> {
        let result = self.calculate_inner(user_id, company_id, service_id).await;
        record_price_calculation("single", status_label(&result));
        result
    }

    async fn calculate_inner(
        &self,
        user_id: Option<i64>,
        company_id: i64,
        service_id: i64,
    ) -> Result<CalculatedPrice, PricingError> {
        let rule = match self
            .rules
            .get_by_company_and_service(company_id, service_id)
            .await
        {
            Ok(rule) => rule,
            Err(StoreError::NotFound(key)) => {
                warn!(company_id, service_id, "Pricing rule not found");
                return Err(PricingError::NotFound(key));
            }
            Err(e) => {
                error!(error = %e, "Failed to load pricing rule");
                return Err(e.into());
            }
        };

        let vehicle_class = self
            .resolve_vehicle_class(user_id, rule.pricing.requires_vehicle_class())
            .await?;

        let price = price_rule(&rule, vehicle_class.as_ref());
        info!(
            company_id,
            service_id,
            price = %price.price,
            currency = %price.currency,
            "Price calculated"
        );
        Ok(price)
    }

    /// Price every service in `service_ids` that has a rule, in request order.
    ///
    /// Services without a rule are left out of the result.
    #[instrument(skip(self, service_ids), fields(services = service_ids.len()))]
    pub async fn batch_calculate(
        &self,
        user_id: Option<i64>,
        company_id: i64,
        service_ids: &[i64],
    ) -> Result<Vec<CalculatedPrice>, PricingError> {
        let result = self
            .batch_calculate_inner(user_id, company_id, service_ids)
            .await;
        record_price_calculation("batch", status_label(&result));
        result
    }

    async fn batch_calculate_inner(
        &self,
        user_id: Option<i64>,
        company_id: i64,
        service_ids: &[i64],
    ) -> Result<Vec<CalculatedPrice>, PricingError> {
        if service_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rules = self
            .rules
            .get_batch_by_company_and_services(company_id, service_ids)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load pricing rules");
                PricingError::from(e)
            })?;

        let needs_vehicle = rules.values().any(|r| r.pricing.requires_vehicle_class());
        let vehicle_class = self.resolve_vehicle_class(user_id, needs_vehicle).await?;

        let mut prices = Vec::with_capacity(service_ids.len());
        for service_id in service_ids {
            let Some(rule) = rules.get(service_id) else {
                warn!(service_id, "Pricing rule not found, skipping");
                continue;
            };
            prices.push(price_rule(rule, vehicle_class.as_ref()));
        }

        info!(
            requested = service_ids.len(),
            calculated = prices.len(),
            "Batch calculation completed"
        );
        Ok(prices)
    }

    /// Fetch the user's vehicle class when `needed`.
    ///
    /// A user without a car and an unhealthy user service both yield `None`;
    /// any other gateway failure aborts the request.
    async fn resolve_vehicle_class(
        &self,
        user_id: Option<i64>,
        needed: bool,
    ) -> Result<Option<VehicleClass>, PricingError> {
        if !needed {
            return Ok(None);
        }
        let Some(user_id) = user_id else {
            record_vehicle_lookup("skipped");
            return Ok(None);
        };

        match self.vehicles.selected_vehicle_class(user_id).await {
            Ok(class) => {
                record_vehicle_lookup("found");
                Ok(Some(class))
            }
            Err(GatewayError::NoCarSelected) => {
                record_vehicle_lookup("no_car_selected");
                info!(user_id, "No selected car, using base prices");
                Ok(None)
            }
            Err(GatewayError::ServiceDegraded(reason)) => {
                record_vehicle_lookup("degraded");
                error!(user_id, reason = %reason, "User service degraded, using base prices");
                Ok(None)
            }
            Err(GatewayError::Other(e)) => {
                record_vehicle_lookup("error");
                error!(user_id, error = %e, "Vehicle lookup failed");
                Err(PricingError::Internal(e))
            }
        }
    }
}

fn price_rule(rule: &PricingRule, vehicle_class: Option<&VehicleClass>) -> CalculatedPrice {
    let (price, advisory) = calculate_price(rule, vehicle_class);
    if let Some(advisory) = advisory {
        record_price_advisory(advisory.kind());
        warn!(
            rule_id = rule.id,
            service_id = rule.service_id,
            advisory = %advisory,
            "Price fell back to base price"
        );
    }
    price
}

fn status_label<T>(result: &Result<T, PricingError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(PricingError::NotFound(_)) => "not_found",
        Err(_) => "error",
    }
}
