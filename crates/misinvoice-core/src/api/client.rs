//! API client for the MIS & Invoicing REST backend.
//!
//! Authentication endpoints live under `/api/auth`; managed entities are
//! plain collections at the root (`/chains`, `/invoices`, ...).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::{AuthService, Credential, Role};
use crate::models::{
    AuthResponse, Brand, Chain, EmailRequest, Estimate, Group, Invoice, LoginRequest,
    MessageResponse, RegisterRequest, ResetPasswordRequest, ResourceKind, ResourceTable, Subzone,
    TableRow,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Backend used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange e-mail and password for a bearer credential.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Credential> {
        let auth: AuthResponse = self
            .send(Method::POST, "/api/auth/login", Some(&LoginRequest { email, password }))
            .await
            .context("Authentication request failed")?;

        Credential::new(auth.token)
            .ok_or_else(|| ApiError::InvalidResponse("empty token in login response".into()).into())
    }

    pub async fn register(&self, name: &str, email: &str, password: &str, role: Role) -> Result<Option<String>> {
        let body = RegisterRequest { name, email, password, role };
        let reply: MessageResponse = self.send(Method::POST, "/api/auth/register", Some(&body)).await?;
        Ok(reply.into_message())
    }

    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>> {
        let reply: MessageResponse = self
            .send(Method::POST, "/api/auth/forgot-password", Some(&EmailRequest { email }))
            .await?;
        Ok(reply.into_message())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<Option<String>> {
        let body = ResetPasswordRequest { token, new_password };
        let reply: MessageResponse = self.send(Method::POST, "/api/auth/reset-password", Some(&body)).await?;
        Ok(reply.into_message())
    }

    pub async fn verify_email(&self, token: &str) -> Result<Option<String>> {
        let reply: MessageResponse = self
            .send_with_query::<(), _>(Method::GET, "/api/auth/verify", &[("token", token)], None)
            .await?;
        Ok(reply.into_message())
    }

    pub async fn resend_verification(&self, email: &str) -> Result<Option<String>> {
        let reply: MessageResponse = self
            .send(Method::POST, "/api/auth/resend-verification", Some(&EmailRequest { email }))
            .await?;
        Ok(reply.into_message())
    }

    // =========================================================================
    // Managed entities
    // =========================================================================

    /// Fetch a collection and render it as a table.
    pub async fn fetch_table(&self, kind: ResourceKind) -> Result<ResourceTable> {
        let path = kind.endpoint();
        match kind {
            ResourceKind::Chains => self.fetch_rows::<Chain>(path).await,
            ResourceKind::Brands => self.fetch_rows::<Brand>(path).await,
            ResourceKind::Groups => self.fetch_rows::<Group>(path).await,
            ResourceKind::SubZones => self.fetch_rows::<Subzone>(path).await,
            ResourceKind::Estimates => self.fetch_rows::<Estimate>(path).await,
            ResourceKind::Invoices => self.fetch_rows::<Invoice>(path).await,
        }
    }

    async fn fetch_rows<T: TableRow>(&self, path: &str) -> Result<ResourceTable> {
        let records: Vec<T> = self
            .send::<(), _>(Method::GET, path, None)
            .await
            .with_context(|| format!("Failed to fetch {}", path))?;
        debug!(path, count = records.len(), "Fetched records");
        Ok(ResourceTable::from_records(&records))
    }

    // =========================================================================
    // Transport
    // =========================================================================

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        self.send_with_query(method, path, &[], body).await
    }

    /// Send a request, retrying on 429 with exponential backoff, and parse
    /// the JSON reply. An empty success body parses as JSON `null`. Query
    /// values are form-encoded by reqwest.
    async fn send_with_query<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(self.auth_headers()?);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(ApiError::from)
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read response from {}", url))?;
                    return parse_body(&text)
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }
}

/// Parse a reply body. Plain-text acknowledgements are read as a JSON string.
fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(serde_json::from_str("null")?);
    }
    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_json::from_value(serde_json::Value::String(trimmed.to_string()))
            .map_err(|_| json_err.into()),
    }
}

#[async_trait]
impl AuthService for ApiClient {
    async fn logout(&self, credential: &Credential) -> Result<()> {
        let client = self.with_token(Some(credential.as_str().to_string()));
        let _: serde_json::Value = client
            .send::<(), _>(Method::POST, "/api/auth/logout", None)
            .await
            .context("Logout request failed")?;
        Ok(())
    }
}
