//! PostgreSQL rule store for price-service.

use crate::models::{ClassTable, NewPricingRule, Pricing, PricingRule, PricingRuleFilter, RuleDraft};
use crate::services::error::{RuleKey, StoreError};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::PricingRuleStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};

const RULE_COLUMNS: &str = "id, company_id, service_id, pricing_type, base_price, currency, \
     vehicle_class_multipliers, vehicle_class_prices, created_at, updated_at";

/// Flat storage shape of a rule.
#[derive(Debug, FromRow)]
struct PricingRuleRow {
    id: i64,
    company_id: i64,
    service_id: i64,
    pricing_type: String,
    base_price: Decimal,
    currency: String,
    vehicle_class_multipliers: Json<ClassTable>,
    vehicle_class_prices: Json<ClassTable>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PricingRuleRow> for PricingRule {
    fn from(row: PricingRuleRow) -> Self {
        Self {
            id: row.id,
            company_id: row.company_id,
            service_id: row.service_id,
            base_price: row.base_price,
            currency: row.currency,
            pricing: Pricing::from_parts(
                &row.pricing_type,
                row.vehicle_class_multipliers.0,
                row.vehicle_class_prices.0,
            ),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Columns derived from a validated draft. The table that does not belong to
/// the variant is stored as `{}`.
fn draft_columns(draft: &RuleDraft) -> (&str, Json<ClassTable>, Json<ClassTable>) {
    (
        draft.pricing.tag(),
        Json(draft.pricing.multipliers().cloned().unwrap_or_default()),
        Json(draft.pricing.class_prices().cloned().unwrap_or_default()),
    )
}

fn internal(context: &str, e: sqlx::Error) -> StoreError {
    StoreError::Internal(anyhow::anyhow!("{}: {}", context, e))
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct PgPricingRuleStore {
    pool: PgPool,
}

impl PgPricingRuleStore {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "price-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl PricingRuleStore for PgPricingRuleStore {
    #[instrument(skip(self, rule), fields(company_id = rule.company_id, service_id = rule.service_id))]
    async fn create(&self, rule: &NewPricingRule) -> Result<PricingRule, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_rule"])
            .start_timer();

        let (pricing_type, multipliers, prices) = draft_columns(&rule.draft);
        let sql = format!(
            r#"
            INSERT INTO pricing_rules (company_id, service_id, pricing_type, base_price, currency, vehicle_class_multipliers, vehicle_class_prices)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            RULE_COLUMNS
        );

        let row = sqlx::query_as::<_, PricingRuleRow>(&sql)
            .bind(rule.company_id)
            .bind(rule.service_id)
            .bind(pricing_type)
            .bind(rule.draft.base_price)
            .bind(&rule.draft.currency)
            .bind(multipliers)
            .bind(prices)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    StoreError::Duplicate {
                        company_id: rule.company_id,
                        service_id: rule.service_id,
                    }
                }
                _ => internal("Failed to create pricing rule", e),
            })?;

        timer.observe_duration();
        info!(rule_id = row.id, "Pricing rule stored");

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<PricingRule, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_rule"])
            .start_timer();

        let sql = format!("SELECT {} FROM pricing_rules WHERE id = $1", RULE_COLUMNS);
        let row = sqlx::query_as::<_, PricingRuleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| internal("Failed to get pricing rule", e))?;

        timer.observe_duration();

        row.map(PricingRule::from)
            .ok_or(StoreError::NotFound(RuleKey::Id(id)))
    }

    #[instrument(skip(self))]
    async fn get_by_company_and_service(
        &self,
        company_id: i64,
        service_id: i64,
    ) -> Result<PricingRule, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_rule_by_service"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM pricing_rules WHERE company_id = $1 AND service_id = $2",
            RULE_COLUMNS
        );
        let row = sqlx::query_as::<_, PricingRuleRow>(&sql)
            .bind(company_id)
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| internal("Failed to get pricing rule", e))?;

        timer.observe_duration();

        row.map(PricingRule::from)
            .ok_or(StoreError::NotFound(RuleKey::CompanyService {
                company_id,
                service_id,
            }))
    }

    #[instrument(skip(self, service_ids), fields(services = service_ids.len()))]
    async fn get_batch_by_company_and_services(
        &self,
        company_id: i64,
        service_ids: &[i64],
    ) -> Result<HashMap<i64, PricingRule>, StoreError> {
        if service_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_rules_batch"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM pricing_rules WHERE company_id = $1 AND service_id = ANY($2)",
            RULE_COLUMNS
        );
        let rows = sqlx::query_as::<_, PricingRuleRow>(&sql)
            .bind(company_id)
            .bind(service_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| internal("Failed to get pricing rules", e))?;

        timer.observe_duration();

        Ok(rows
            .into_iter()
            .map(|row| (row.service_id, PricingRule::from(row)))
            .collect())
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &PricingRuleFilter) -> Result<Vec<PricingRule>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_rules"])
            .start_timer();

        let sql = format!(
            r#"
            SELECT {} FROM pricing_rules
            WHERE ($1::BIGINT IS NULL OR company_id = $1)
              AND ($2::BIGINT IS NULL OR service_id = $2)
            ORDER BY created_at DESC, id DESC
            "#,
            RULE_COLUMNS
        );
        let rows = sqlx::query_as::<_, PricingRuleRow>(&sql)
            .bind(filter.company_id)
            .bind(filter.service_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| internal("Failed to list pricing rules", e))?;

        timer.observe_duration();

        Ok(rows.into_iter().map(PricingRule::from).collect())
    }

    #[instrument(skip(self, draft))]
    async fn update(&self, id: i64, draft: &RuleDraft) -> Result<PricingRule, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_rule"])
            .start_timer();

        let (pricing_type, multipliers, prices) = draft_columns(draft);
        let sql = format!(
            r#"
            UPDATE pricing_rules
            SET pricing_type = $2, base_price = $3, currency = $4,
                vehicle_class_multipliers = $5, vehicle_class_prices = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            RULE_COLUMNS
        );
        let row = sqlx::query_as::<_, PricingRuleRow>(&sql)
            .bind(id)
            .bind(pricing_type)
            .bind(draft.base_price)
            .bind(&draft.currency)
            .bind(multipliers)
            .bind(prices)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| internal("Failed to update pricing rule", e))?;

        timer.observe_duration();

        row.map(PricingRule::from)
            .ok_or(StoreError::NotFound(RuleKey::Id(id)))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_rule"])
            .start_timer();

        let result = sqlx::query("DELETE FROM pricing_rules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("Failed to delete pricing rule", e))?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(RuleKey::Id(id)));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| internal("Health check failed", e))?;

        timer.observe_duration();
        Ok(())
    }
}
