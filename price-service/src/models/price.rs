//! Calculated price model.

use rust_decimal::Decimal;
use serde::Serialize;

/// Price of one service for one user, as produced by the calculator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculatedPrice {
    pub company_id: i64,
    pub service_id: i64,
    pub price: Decimal,
    pub currency: String,
    pub pricing_type: String,
    /// The vehicle class the calculation was asked about; `None` when no
    /// class was applied (static rule or unknown user vehicle).
    pub vehicle_class: Option<String>,
}
