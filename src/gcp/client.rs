//! GCP Client
//!
//! Main client for interacting with GCP APIs, combining authentication
//! and HTTP functionality.

use super::auth::{GcpCredentials, TokenSource};
use super::http::GcpHttpClient;
use crate::error::FetchError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_RESOURCEMANAGER_ENDPOINT: &str = "https://cloudresourcemanager.googleapis.com";
pub const DEFAULT_CLOUDASSET_ENDPOINT: &str = "https://cloudasset.googleapis.com";

/// Base URLs of the APIs this client talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub resourcemanager: String,
    pub cloudasset: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            resourcemanager: DEFAULT_RESOURCEMANAGER_ENDPOINT.to_string(),
            cloudasset: DEFAULT_CLOUDASSET_ENDPOINT.to_string(),
        }
    }
}

impl Endpoints {
    /// Point both APIs at the same base URL (mock servers, private gateways)
    pub fn single(base: &str) -> Self {
        Self {
            resourcemanager: base.to_string(),
            cloudasset: base.to_string(),
        }
    }
}

/// Main GCP client
#[derive(Clone, Debug)]
pub struct GcpClient {
    tokens: TokenSource,
    http: GcpHttpClient,
    endpoints: Endpoints,
}

impl GcpClient {
    /// Create a client authenticated with Application Default Credentials
    pub async fn new(endpoints: Endpoints) -> Result<Self> {
        let credentials = GcpCredentials::new()
            .await
            .context("Failed to initialize GCP credentials")?;

        Self::with_token_source(endpoints, TokenSource::Adc(credentials))
    }

    /// Create a client that sends a fixed bearer token
    pub fn with_static_token(endpoints: Endpoints, token: &str) -> Result<Self> {
        Self::with_token_source(endpoints, TokenSource::Static(token.to_string()))
    }

    fn with_token_source(endpoints: Endpoints, tokens: TokenSource) -> Result<Self> {
        let http = GcpHttpClient::new()?;
        Ok(Self {
            tokens,
            http,
            endpoints,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Get the current access token
    async fn get_token(&self) -> Result<String, FetchError> {
        self.tokens
            .token()
            .await
            .map_err(|e| FetchError::Auth(format!("{:#}", e)))
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value, FetchError> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str, body: &Value) -> Result<Value, FetchError> {
        let token = self.get_token().await?;
        self.http.post(url, &token, body).await
    }

    // =========================================================================
    // Resource Manager API helpers
    // =========================================================================

    /// Build Resource Manager API URL
    pub fn resourcemanager_url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.endpoints.resourcemanager.trim_end_matches('/'),
            path
        )
    }

    // =========================================================================
    // Cloud Asset API helpers
    // =========================================================================

    /// Build Cloud Asset API URL
    pub fn cloudasset_url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.endpoints.cloudasset.trim_end_matches('/'),
            path
        )
    }
}
