use super::{
    INDEX_BAND, ImageQuery, ImageryPlatform, IndexStatistics, PlatformError, PlatformResult,
    ServiceAccountKey, TokenSource, expression, transport_error,
};
use crate::config::ImageryConfig;
use crate::models::Polygon;
use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ComputeResponse {
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// HTTP client for the Earth Engine `value:compute` endpoint.
#[derive(Clone)]
pub struct EarthEngineClient {
    http: reqwest::Client,
    tokens: TokenSource,
    compute_url: String,
    timeout: Duration,
}

impl EarthEngineClient {
    pub fn new(config: &ImageryConfig, key: ServiceAccountKey) -> Result<Self> {
        let project = config
            .project
            .clone()
            .or_else(|| key.project_id.clone())
            .context("No imagery project configured (EE_PROJECT) and the key has no project_id")?;

        let timeout = config.timeout();
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the imagery platform")?;

        let compute_url = format!(
            "{}/v1/projects/{}/value:compute",
            config.api_base_url.trim_end_matches('/'),
            project
        );

        Ok(Self {
            tokens: TokenSource::new(key, http.clone(), timeout),
            http,
            compute_url,
            timeout,
        })
    }

    /// Builds the client from configured credentials and proves them by
    /// fetching a first access token.
    pub async fn connect(config: &ImageryConfig) -> Result<Self> {
        let source = config
            .credential_source()
            .context("No service account credentials configured")?;
        let key = ServiceAccountKey::load(&source)?;
        let client = Self::new(config, key)?;

        client
            .tokens
            .access_token()
            .await
            .context("Failed to authenticate with the imagery platform")?;

        tracing::info!(
            "Imagery platform initialized for {}",
            client.tokens.key().client_email
        );
        Ok(client)
    }

    async fn compute(&self, expression: Value) -> PlatformResult<Value> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(&self.compute_url)
            .bearer_auth(token.expose_secret())
            .json(&json!({ "expression": expression }))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => PlatformError::from_status(
                    status.as_u16(),
                    envelope.error.status.as_deref(),
                    envelope.error.message,
                ),
                Err(_) => PlatformError::from_status(status.as_u16(), None, body),
            });
        }

        let parsed: ComputeResponse = serde_json::from_str(&body).map_err(|e| {
            PlatformError::Computation(format!("Unreadable compute response: {}", e))
        })?;
        Ok(parsed.result)
    }
}

impl ImageryPlatform for EarthEngineClient {
    async fn collection_size(&self, query: &ImageQuery) -> PlatformResult<u64> {
        let value = self.compute(expression::collection_size(query)).await?;
        value.as_u64().ok_or_else(|| {
            PlatformError::Computation(format!("Expected a collection size, got {}", value))
        })
    }

    async fn index_statistics(&self, query: &ImageQuery) -> PlatformResult<IndexStatistics> {
        let value = self.compute(expression::index_statistics(query)).await?;
        Ok(parse_statistics(&value))
    }

    async fn area_square_meters(&self, geometry: &Polygon) -> PlatformResult<f64> {
        let value = self.compute(expression::area(geometry)).await?;
        value
            .as_f64()
            .ok_or_else(|| PlatformError::Computation(format!("Expected an area, got {}", value)))
    }
}

fn parse_statistics(value: &Value) -> IndexStatistics {
    let stat = |suffix: &str| value.get(format!("{}_{}", INDEX_BAND, suffix)).and_then(Value::as_f64);
    IndexStatistics {
        mean: stat("mean"),
        min: stat("min"),
        max: stat("max"),
    }
}
