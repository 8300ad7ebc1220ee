use crate::dtos::{CalculatePricesRequest, CalculatePricesResponse};
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;
use service_core::utils::ValidatedJson;

pub async fn calculate_prices(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CalculatePricesRequest>,
) -> Result<Json<CalculatePricesResponse>, AppError> {
    let prices = state
        .prices
        .batch_calculate(req.user_id, req.company_id, &req.service_ids)
        .await?;

    Ok(Json(CalculatePricesResponse { prices }))
}
