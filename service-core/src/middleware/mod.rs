pub mod metrics;
pub mod tracing;
