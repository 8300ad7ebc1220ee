//! Pricing rule validation.
//!
//! Create and update share one path: the update patch is overlaid onto the
//! current rule to form a complete candidate, and that candidate goes
//! through the same checks a create does. Checks run in a fixed order and
//! stop at the first violation.

use crate::models::{
    is_standard_code, ClassTable, CreatePricingRule, NewPricingRule, Pricing, PricingRule,
    PricingRulePatch, PricingType, RuleDraft,
};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Rule fields a validation failure can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    CompanyId,
    ServiceId,
    PricingType,
    BasePrice,
    Currency,
    VehicleClassMultipliers,
    VehicleClassPrices,
}

impl RuleField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleField::CompanyId => "company_id",
            RuleField::ServiceId => "service_id",
            RuleField::PricingType => "pricing_type",
            RuleField::BasePrice => "base_price",
            RuleField::Currency => "currency",
            RuleField::VehicleClassMultipliers => "vehicle_class_multipliers",
            RuleField::VehicleClassPrices => "vehicle_class_prices",
        }
    }
}

impl fmt::Display for RuleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("base_price is required for all pricing types")]
    MissingBasePrice,

    #[error(
        "invalid pricing_type '{0}' (allowed: static, vehicle_class_multiplier, vehicle_class_fixed)"
    )]
    UnknownPricingType(String),

    #[error("{field} is required for pricing_type '{pricing_type}'")]
    MissingClassTable {
        field: RuleField,
        pricing_type: PricingType,
    },

    #[error("{field} should not be set for pricing_type '{pricing_type}'")]
    UnexpectedClassTable {
        field: RuleField,
        pricing_type: PricingType,
    },

    #[error("base_price must not be negative")]
    NegativeBasePrice,

    #[error("{field} entry for vehicle class '{vehicle_class}' must be {requirement}")]
    InvalidClassValue {
        field: RuleField,
        vehicle_class: String,
        requirement: &'static str,
    },

    #[error("currency must be a 3-letter code, got '{0}'")]
    InvalidCurrency(String),

    #[error("{0} must be a positive id")]
    InvalidId(RuleField),
}

impl ValidationError {
    /// The field the failure is about.
    pub fn field(&self) -> RuleField {
        match self {
            ValidationError::MissingBasePrice | ValidationError::NegativeBasePrice => {
                RuleField::BasePrice
            }
            ValidationError::UnknownPricingType(_) => RuleField::PricingType,
            ValidationError::MissingClassTable { field, .. }
            | ValidationError::UnexpectedClassTable { field, .. }
            | ValidationError::InvalidClassValue { field, .. } => *field,
            ValidationError::InvalidCurrency(_) => RuleField::Currency,
            ValidationError::InvalidId(field) => *field,
        }
    }
}

/// Effective rule state under validation.
struct Candidate<'a> {
    pricing_type: &'a str,
    base_price: Option<Decimal>,
    currency: &'a str,
    multipliers: Option<&'a ClassTable>,
    prices: Option<&'a ClassTable>,
}

/// Validate a create request, producing the rule to insert.
pub fn validate_for_create(input: &CreatePricingRule) -> Result<NewPricingRule, ValidationError> {
    if input.company_id <= 0 {
        return Err(ValidationError::InvalidId(RuleField::CompanyId));
    }
    if input.service_id <= 0 {
        return Err(ValidationError::InvalidId(RuleField::ServiceId));
    }

    let draft = validate_candidate(Candidate {
        pricing_type: &input.pricing_type,
        base_price: input.base_price,
        currency: &input.currency,
        multipliers: input.vehicle_class_multipliers.as_ref(),
        prices: input.vehicle_class_prices.as_ref(),
    })?;

    Ok(NewPricingRule {
        company_id: input.company_id,
        service_id: input.service_id,
        draft,
    })
}

/// Validate the state `current` would be in after applying `patch`.
pub fn validate_for_update(
    current: &PricingRule,
    patch: &PricingRulePatch,
) -> Result<RuleDraft, ValidationError> {
    let pricing_type = patch
        .pricing_type
        .as_deref()
        .unwrap_or_else(|| current.pricing.tag());
    let multipliers = patch
        .vehicle_class_multipliers
        .as_ref()
        .or_else(|| current.pricing.multipliers());
    let prices = patch
        .vehicle_class_prices
        .as_ref()
        .or_else(|| current.pricing.class_prices());

    validate_candidate(Candidate {
        pricing_type,
        base_price: patch.base_price.or(Some(current.base_price)),
        currency: patch.currency.as_deref().unwrap_or(&current.currency),
        multipliers,
        prices,
    })
}

fn validate_candidate(candidate: Candidate<'_>) -> Result<RuleDraft, ValidationError> {
    let base_price = candidate
        .base_price
        .ok_or(ValidationError::MissingBasePrice)?;

    let pricing_type = PricingType::parse(candidate.pricing_type)
        .ok_or_else(|| ValidationError::UnknownPricingType(candidate.pricing_type.to_string()))?;

    let multipliers = candidate.multipliers.filter(|t| !t.is_empty());
    let prices = candidate.prices.filter(|t| !t.is_empty());

    let pricing = match pricing_type {
        PricingType::Static => {
            forbid(multipliers, RuleField::VehicleClassMultipliers, pricing_type)?;
            forbid(prices, RuleField::VehicleClassPrices, pricing_type)?;
            Pricing::Static
        }
        PricingType::VehicleClassMultiplier => {
            let table = require(multipliers, RuleField::VehicleClassMultipliers, pricing_type)?;
            forbid(prices, RuleField::VehicleClassPrices, pricing_type)?;
            Pricing::VehicleClassMultiplier(table.clone())
        }
        PricingType::VehicleClassFixed => {
            let table = require(prices, RuleField::VehicleClassPrices, pricing_type)?;
            forbid(multipliers, RuleField::VehicleClassMultipliers, pricing_type)?;
            Pricing::VehicleClassFixed(table.clone())
        }
    };

    if base_price.is_sign_negative() && !base_price.is_zero() {
        return Err(ValidationError::NegativeBasePrice);
    }

    if let Some(table) = pricing.multipliers() {
        check_values(
            table,
            RuleField::VehicleClassMultipliers,
            |v| v > Decimal::ZERO,
            "greater than zero",
        )?;
    }
    if let Some(table) = pricing.class_prices() {
        check_values(
            table,
            RuleField::VehicleClassPrices,
            |v| v >= Decimal::ZERO,
            "non-negative",
        )?;
    }

    let currency = candidate.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidCurrency(candidate.currency.to_string()));
    }

    Ok(RuleDraft {
        base_price,
        currency: currency.to_ascii_uppercase(),
        pricing,
    })
}

fn require(
    table: Option<&ClassTable>,
    field: RuleField,
    pricing_type: PricingType,
) -> Result<&ClassTable, ValidationError> {
    table.ok_or(ValidationError::MissingClassTable {
        field,
        pricing_type,
    })
}

fn forbid(
    table: Option<&ClassTable>,
    field: RuleField,
    pricing_type: PricingType,
) -> Result<(), ValidationError> {
    match table {
        Some(_) => Err(ValidationError::UnexpectedClassTable {
            field,
            pricing_type,
        }),
        None => Ok(()),
    }
}

fn check_values(
    table: &ClassTable,
    field: RuleField,
    accept: impl Fn(Decimal) -> bool,
    requirement: &'static str,
) -> Result<(), ValidationError> {
    for (class, value) in table {
        if !accept(*value) {
            return Err(ValidationError::InvalidClassValue {
                field,
                vehicle_class: class.clone(),
                requirement,
            });
        }
        if !is_standard_code(class) {
            tracing::warn!(
                field = %field,
                vehicle_class = %class,
                "Pricing rule uses a non-standard vehicle class code"
            );
        }
    }
    Ok(())
}
