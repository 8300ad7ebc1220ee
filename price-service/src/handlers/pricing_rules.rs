use crate::dtos::{
    CreatePricingRuleRequest, ListPricingRulesQuery, PricingRuleListResponse, PricingRuleResponse,
    UpdatePricingRuleRequest,
};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use service_core::utils::ValidatedJson;

pub async fn create_pricing_rule(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreatePricingRuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rule = state.rules.create(&req.into()).await?;
    Ok((StatusCode::CREATED, Json(PricingRuleResponse::from(rule))))
}

pub async fn get_pricing_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PricingRuleResponse>, AppError> {
    let rule = state.rules.get(id).await?;
    Ok(Json(rule.into()))
}

pub async fn list_pricing_rules(
    State(state): State<AppState>,
    Query(query): Query<ListPricingRulesQuery>,
) -> Result<Json<PricingRuleListResponse>, AppError> {
    let rules = state.rules.list(&query.into()).await?;
    Ok(Json(rules.into()))
}

pub async fn update_pricing_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdatePricingRuleRequest>,
) -> Result<Json<PricingRuleResponse>, AppError> {
    let rule = state.rules.update(id, &req.into()).await?;
    Ok(Json(rule.into()))
}

pub async fn delete_pricing_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.rules.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
