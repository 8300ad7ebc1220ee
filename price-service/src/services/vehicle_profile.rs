//! Vehicle profile lookup against the user service.

use crate::config::UserServiceConfig;
use crate::models::VehicleClass;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use service_core::observability::TracedClientExt;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The user has no selected vehicle.
    #[error("user has no selected car")]
    NoCarSelected,

    /// The user service is unreachable or unhealthy.
    #[error("user service degraded: {0}")]
    ServiceDegraded(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Resolves the vehicle class of a user's currently selected car.
#[async_trait]
pub trait VehicleProfileGateway: Send + Sync {
    async fn selected_vehicle_class(&self, user_id: i64) -> Result<VehicleClass, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct SelectedCarResponse {
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    vehicle_class: Option<String>,
}

impl SelectedCarResponse {
    fn class(self) -> Option<String> {
        self.size
            .or(self.vehicle_class)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }
}

/// HTTP client for `GET {base_url}/internal/users/{user_id}/cars/selected`.
#[derive(Clone)]
pub struct UserServiceClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl UserServiceClient {
    pub fn new(config: &UserServiceConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl VehicleProfileGateway for UserServiceClient {
    #[instrument(skip(self))]
    async fn selected_vehicle_class(&self, user_id: i64) -> Result<VehicleClass, GatewayError> {
        let url = format!("{}/internal/users/{}/cars/selected", self.base_url, user_id);

        let response = self
            .client
            .traced_get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "User service request failed");
                GatewayError::ServiceDegraded(e.to_string())
            })?;

        let status = response.status();
        match status {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(GatewayError::NoCarSelected),
            s if s.is_server_error() => {
                return Err(GatewayError::ServiceDegraded(format!(
                    "user service returned {}",
                    s
                )));
            }
            s => {
                return Err(GatewayError::Other(anyhow::anyhow!(
                    "unexpected status {} from user service",
                    s
                )));
            }
        }

        let body: SelectedCarResponse = response.json().await.map_err(|e| {
            GatewayError::Other(anyhow::anyhow!(
                "failed to decode selected car response: {}",
                e
            ))
        })?;

        body.class()
            .map(VehicleClass::from)
            .ok_or(GatewayError::NoCarSelected)
    }
}
