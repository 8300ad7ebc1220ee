use crate::models::CalculatedPrice;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CalculatePricesRequest {
    #[validate(range(min = 1, message = "company_id must be positive"))]
    pub company_id: i64,
    /// Absent means no user context: class-based rules use their base price.
    pub user_id: Option<i64>,
    #[serde(default)]
    pub service_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct CalculatePricesResponse {
    pub prices: Vec<CalculatedPrice>,
}
