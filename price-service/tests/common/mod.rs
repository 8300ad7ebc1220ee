//! Test helper module for price-service integration tests.
//!
//! Spawns the service with a wiremock user service and either the in-memory
//! rule store or PostgreSQL. PostgreSQL tests run in a fresh schema of the
//! database named by `TEST_DATABASE_URL` and are skipped when it is unset.

#![allow(dead_code)]

use price_service::config::{DatabaseConfig, PriceConfig, StorageConfig, UserServiceConfig};
use price_service::startup::Application;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicU32, Ordering};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER_SERVICE_TIMEOUT_MS: u64 = 300;

// Counter for unique schema names
static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Database URL for PostgreSQL-backed tests, if configured.
pub fn get_test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .ok()
        .filter(|url| !url.is_empty())
}

/// Generate a unique schema name for test isolation.
fn unique_schema_name() -> String {
    let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("test_price_{}_{}", std::process::id(), counter)
}

/// Create an empty schema and return a URL whose search path points at it.
pub async fn create_test_schema(base_url: &str, schema_name: &str) -> String {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(base_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
        .execute(&pool)
        .await
        .ok();
    sqlx::query(&format!("CREATE SCHEMA {}", schema_name))
        .execute(&pool)
        .await
        .expect("Failed to create test schema");
    pool.close().await;

    let separator = if base_url.contains('?') { "&" } else { "?" };
    format!(
        "{}{}options=-c search_path%3D{}",
        base_url, separator, schema_name
    )
}

/// Drop a schema created by [`create_test_schema`].
pub async fn drop_test_schema(base_url: &str, schema_name: &str) {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(base_url)
        .await
        .ok();

    if let Some(pool) = pool {
        let _ = sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
            .execute(&pool)
            .await;
        pool.close().await;
    }
}

/// Fresh schema name plus a URL scoped to it, or `None` without a test database.
pub async fn postgres_test_schema() -> Option<(String, String)> {
    let Some(base_url) = get_test_database_url() else {
        eprintln!("TEST_DATABASE_URL not set; skipping PostgreSQL test");
        return None;
    };
    let schema_name = unique_schema_name();
    let url = create_test_schema(&base_url, &schema_name).await;
    Some((schema_name, url))
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub http_address: String,
    pub http_port: u16,
    pub user_service: MockServer,
    pub client: Client,
    schema_name: Option<String>,
}

impl TestApp {
    /// Spawn a new test application on a random port with the in-memory store.
    pub async fn spawn() -> Self {
        Self::spawn_with(StorageConfig::Memory, None).await
    }

    /// Spawn against PostgreSQL in a fresh schema, or `None` without a test
    /// database.
    pub async fn spawn_postgres() -> Option<Self> {
        let (schema_name, url) = postgres_test_schema().await?;
        let storage = StorageConfig::Postgres(DatabaseConfig {
            url: Secret::new(url),
            max_connections: 5,
            min_connections: 1,
        });
        Some(Self::spawn_with(storage, Some(schema_name)).await)
    }

    async fn spawn_with(storage: StorageConfig, schema_name: Option<String>) -> Self {
        let user_service = MockServer::start().await;

        let config = PriceConfig {
            common: CoreConfig {
                host: IpAddr::V4(Ipv4Addr::LOCALHOST),
                port: 0, // Random port
            },
            service_name: "price-service-test".to_string(),
            log_level: "warn".to_string(),
            otlp_endpoint: None,
            storage,
            user_service: UserServiceConfig {
                base_url: user_service.uri(),
                timeout_ms: USER_SERVICE_TIMEOUT_MS,
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let http_port = app.port();
        let http_address = format!("http://127.0.0.1:{}", http_port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = Client::new();
        let health_url = format!("{}/health", http_address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            http_address,
            http_port,
            user_service,
            client,
            schema_name,
        }
    }

    /// Cleanup test resources (schema).
    pub async fn cleanup(&self) {
        if let (Some(base_url), Some(schema_name)) = (get_test_database_url(), &self.schema_name) {
            drop_test_schema(&base_url, schema_name).await;
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.http_address, path)
    }

    pub async fn post_rule(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/v1/pricing-rules"))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Create a rule and return its JSON representation.
    pub async fn create_rule(&self, body: Value) -> Value {
        let response = self.post_rule(&body).await;
        assert_eq!(response.status().as_u16(), 201, "rule creation failed");
        response.json().await.expect("Failed to parse JSON")
    }

    pub async fn calculate(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/v1/prices/calculate"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Make the user service report `size` as the selected car of `user_id`.
    pub async fn mock_selected_car(&self, user_id: i64, size: &str, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/internal/users/{}/cars/selected", user_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "brand": "Skoda",
                "model": "Octavia",
                "size": size,
            })))
            .expect(expected_calls)
            .mount(&self.user_service)
            .await;
    }

    /// Make the user service answer `status` with an empty body for `user_id`.
    pub async fn mock_user_service_status(&self, user_id: i64, status: u16, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/internal/users/{}/cars/selected", user_id)))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected_calls)
            .mount(&self.user_service)
            .await;
    }
}

pub fn static_rule(company_id: i64, service_id: i64, base_price: f64) -> Value {
    json!({
        "company_id": company_id,
        "service_id": service_id,
        "pricing_type": "static",
        "base_price": base_price,
        "currency": "RUB",
    })
}

pub fn multiplier_rule(company_id: i64, service_id: i64, base_price: f64) -> Value {
    json!({
        "company_id": company_id,
        "service_id": service_id,
        "pricing_type": "vehicle_class_multiplier",
        "base_price": base_price,
        "currency": "RUB",
        "vehicle_class_multipliers": { "A": 0.8, "C": 1.5, "E": 2.0 },
    })
}

pub fn fixed_rule(company_id: i64, service_id: i64, base_price: f64) -> Value {
    json!({
        "company_id": company_id,
        "service_id": service_id,
        "pricing_type": "vehicle_class_fixed",
        "base_price": base_price,
        "currency": "RUB",
        "vehicle_class_prices": { "A": 800, "J": 1800 },
    })
}

/// Read a JSON number as an exact decimal.
pub fn decimal(value: &Value) -> Decimal {
    value
        .to_string()
        .parse()
        .unwrap_or_else(|_| panic!("not a decimal: {}", value))
}

pub fn dec(value: &str) -> Decimal {
    value.parse().expect("invalid decimal literal")
}
