//! price-service: vehicle-class aware pricing rules and price calculation.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
