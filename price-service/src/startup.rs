//! Application startup and lifecycle management.

use crate::config::{PriceConfig, StorageConfig};
use crate::handlers::{self, prices, pricing_rules};
use crate::services::{
    init_metrics, InMemoryPricingRuleStore, PgPricingRuleStore, PriceOrchestrator,
    PricingRuleService, PricingRuleStore, UserServiceClient, VehicleProfileGateway,
};
use axum::{
    body::Body,
    middleware,
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::{make_request_span, request_id_middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub rules: PricingRuleService,
    pub prices: PriceOrchestrator,
    pub store: Arc<dyn PricingRuleStore>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PricingRuleStore>,
        vehicles: Arc<dyn VehicleProfileGateway>,
    ) -> Self {
        Self {
            rules: PricingRuleService::new(store.clone()),
            prices: PriceOrchestrator::new(store.clone(), vehicles),
            store,
        }
    }
}

/// HTTP routes with the request-id, metrics, tracing and CORS layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/v1/prices/calculate", post(prices::calculate_prices))
        .route(
            "/api/v1/pricing-rules",
            get(pricing_rules::list_pricing_rules).post(pricing_rules::create_pricing_rule),
        )
        .route(
            "/api/v1/pricing-rules/:id",
            get(pricing_rules::get_pricing_rule)
                .put(pricing_rules::update_pricing_rule)
                .delete(pricing_rules::delete_pricing_rule),
        )
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: PriceConfig) -> Result<Self, AppError> {
        init_metrics();

        let store: Arc<dyn PricingRuleStore> = match &config.storage {
            StorageConfig::Postgres(db_config) => {
                let db = PgPricingRuleStore::new(
                    db_config.url.expose_secret(),
                    db_config.max_connections,
                    db_config.min_connections,
                )
                .await?;
                db.run_migrations().await?;
                Arc::new(db)
            }
            StorageConfig::Memory => {
                tracing::warn!("Using in-memory rule store; rules are lost on restart");
                Arc::new(InMemoryPricingRuleStore::new())
            }
        };

        let vehicles = Arc::new(UserServiceClient::new(&config.user_service));
        tracing::info!(
            user_service_url = %vehicles.base_url(),
            timeout_ms = config.user_service.timeout_ms,
            "User service client configured"
        );

        let router = build_router(AppState::new(store, vehicles));

        let addr = config.common.socket_addr();
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        tracing::info!(%addr, "HTTP listener bound");

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the HTTP server until it stops.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        tracing::info!(
            service = "price-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, self.router).await
    }
}
