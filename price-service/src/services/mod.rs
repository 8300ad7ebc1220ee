//! Services module for price-service.

pub mod calculator;
pub mod database;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod orchestrator;
pub mod pricing_rules;
pub mod store;
pub mod validator;
pub mod vehicle_profile;

pub use calculator::{calculate_price, PriceAdvisory};
pub use database::PgPricingRuleStore;
pub use error::{PricingError, RuleKey, StoreError};
pub use memory::InMemoryPricingRuleStore;
pub use metrics::{
    get_metrics, init_metrics, record_price_advisory, record_price_calculation,
    record_rule_operation, record_vehicle_lookup,
};
pub use orchestrator::PriceOrchestrator;
pub use pricing_rules::PricingRuleService;
pub use store::PricingRuleStore;
pub use validator::{validate_for_create, validate_for_update, RuleField, ValidationError};
pub use vehicle_profile::{GatewayError, UserServiceClient, VehicleProfileGateway};
