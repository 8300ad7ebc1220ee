//! Error kinds surfaced by price-service operations.

use crate::services::validator::ValidationError;
use service_core::error::AppError;
use std::fmt;
use thiserror::Error;

/// How a missing rule was looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKey {
    Id(i64),
    CompanyService { company_id: i64, service_id: i64 },
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKey::Id(id) => write!(f, "id={}", id),
            RuleKey::CompanyService {
                company_id,
                service_id,
            } => write!(f, "company_id={}, service_id={}", company_id, service_id),
        }
    }
}

/// Failures reported by a rule store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("pricing rule not found ({0})")]
    NotFound(RuleKey),

    #[error("pricing rule already exists for company_id={company_id}, service_id={service_id}")]
    Duplicate { company_id: i64, service_id: i64 },

    #[error("rule store failure: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Outcome kinds of pricing and rule-management operations.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("pricing rule not found ({0})")]
    NotFound(RuleKey),

    #[error("pricing rule already exists for company_id={company_id}, service_id={service_id}")]
    DuplicateRule { company_id: i64, service_id: i64 },

    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

impl From<StoreError> for PricingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => PricingError::NotFound(key),
            StoreError::Duplicate {
                company_id,
                service_id,
            } => PricingError::DuplicateRule {
                company_id,
                service_id,
            },
            StoreError::Internal(e) => PricingError::Internal(e),
        }
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::Validation(e) => AppError::BadRequest(anyhow::Error::new(e)),
            e @ PricingError::NotFound(_) => AppError::NotFound(anyhow::Error::new(e)),
            e @ PricingError::DuplicateRule { .. } => AppError::Conflict(anyhow::Error::new(e)),
            PricingError::Internal(e) => AppError::InternalError(e),
        }
    }
}
