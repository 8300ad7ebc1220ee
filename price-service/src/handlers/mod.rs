//! HTTP handlers for price-service.

pub mod health;
pub mod prices;
pub mod pricing_rules;

pub use health::{health_check, metrics_handler, readiness_check};
