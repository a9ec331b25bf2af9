use super::{PlatformError, PlatformResult, transport_error};
use crate::config::CredentialSource;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const EARTH_ENGINE_SCOPE: &str = "https://www.googleapis.com/auth/earthengine";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// The fields of a service-account JSON key that token exchange needs.
#[derive(Debug, Clone)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: SecretString,
    pub token_uri: String,
    pub project_id: Option<String>,
}

#[derive(Deserialize)]
struct KeyFile {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    #[serde(default)]
    project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn load(source: &CredentialSource) -> Result<Self> {
        match source {
            CredentialSource::File(path) => Self::from_file(path),
            CredentialSource::Inline(raw) => Self::from_json(raw.expose_secret())
                .context("Invalid service account key in GEE_SERVICE_ACCOUNT_KEY"),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read service account key {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid service account key {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: KeyFile = serde_json::from_str(raw)?;
        if file.client_email.trim().is_empty() {
            anyhow::bail!("client_email is empty");
        }
        Ok(Self {
            client_email: file.client_email,
            private_key: SecretString::from(file.private_key),
            token_uri: file.token_uri,
            project_id: file.project_id,
        })
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: SecretString,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Exchanges a signed service-account assertion for OAuth access tokens and
/// caches the result until shortly before it expires.
#[derive(Clone)]
pub struct TokenSource {
    key: Arc<ServiceAccountKey>,
    http: reqwest::Client,
    timeout: std::time::Duration,
    cached: Arc<Mutex<Option<CachedToken>>>,
}

impl TokenSource {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client, timeout: std::time::Duration) -> Self {
        Self {
            key: Arc::new(key),
            http,
            timeout,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    pub fn key(&self) -> &ServiceAccountKey {
        &self.key
    }

    pub async fn access_token(&self) -> PlatformResult<SecretString> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> PlatformResult<String> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: EARTH_ENGINE_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.expose_secret().as_bytes())
            .map_err(|e| {
                PlatformError::Authentication(format!("Invalid service account private key: {}", e))
            })?;

        encode(&Header::new(Algorithm::RS256), &claims, &signing_key).map_err(|e| {
            PlatformError::Authentication(format!("Failed to sign token assertion: {}", e))
        })
    }

    async fn fetch(&self) -> PlatformResult<CachedToken> {
        let now = Utc::now();
        let assertion = self.signed_assertion(now)?;

        tracing::debug!("Requesting access token for {}", self.key.client_email);
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body,
            };
            return Err(PlatformError::Authentication(format!(
                "Token exchange rejected ({}): {}",
                status, message
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            PlatformError::Authentication(format!("Unreadable token response: {}", e))
        })?;

        Ok(CachedToken {
            value: SecretString::from(token.access_token),
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}
