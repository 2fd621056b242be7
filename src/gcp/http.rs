//! HTTP utilities for GCP REST API calls

use crate::error::FetchError;
use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and drops non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Pull `error.message` out of a GCP error payload, if present
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| sanitize_for_log(body))
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone, Debug)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("gcporg/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str, token: &str) -> Result<Value, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).bearer_auth(token).send().await?;

        Self::read_json(url, response).await
    }

    /// Make a POST request with a JSON body to a GCP API
    pub async fn post(&self, url: &str, token: &str, body: &Value) -> Result<Value, FetchError> {
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        Self::read_json(url, response).await
    }

    async fn read_json(url: &str, response: Response) -> Result<Value, FetchError> {
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("API returned 404 for {}", url);
            return Err(FetchError::NotFound(error_message(&body)));
        }

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        // Handle empty response
        if body.is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Format a GCP API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_gcp_error(error: &crate::error::Error) -> String {
    use crate::error::Error;

    let fetch = match error {
        Error::Fetch(fetch) => fetch,
        Error::Service(_) => {
            return "Authentication failed. Run 'gcloud auth application-default login'.".to_string();
        }
        Error::Parse(parse) => return format!("Malformed data from GCP: {}", parse),
        Error::Sink(message) => return format!("Output failed: {}", message),
    };

    match fetch.status() {
        Some(403) => "Permission denied. Check your GCP IAM permissions.".to_string(),
        Some(401) => {
            "Authentication failed. Run 'gcloud auth application-default login'.".to_string()
        }
        Some(404) => "Resource not found.".to_string(),
        Some(429) => "Rate limit exceeded. Please try again later.".to_string(),
        Some(400) => "Invalid request. Check your parameters.".to_string(),
        Some(500) | Some(503) => {
            "GCP service temporarily unavailable. Please try again.".to_string()
        }
        Some(_) => "Request failed. Check your network connection and try again.".to_string(),
        None => {
            let error_str = fetch.to_string();
            let sanitized = error_str
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(80)
                .collect::<String>();

            if sanitized.len() < error_str.len() {
                format!("{}...", sanitized)
            } else {
                sanitized
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FetchError};

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_error_message_prefers_gcp_payload() {
        let body = r#"{"error":{"code":403,"message":"caller lacks permission"}}"#;
        assert_eq!(error_message(body), "caller lacks permission");
        assert_eq!(error_message("plain text"), "plain text");
    }

    #[test]
    fn test_format_gcp_error_by_status() {
        let err = Error::Fetch(FetchError::Api {
            status: 403,
            message: "denied".to_string(),
        });
        assert_eq!(
            format_gcp_error(&err),
            "Permission denied. Check your GCP IAM permissions."
        );

        let err = Error::Fetch(FetchError::Api {
            status: 503,
            message: String::new(),
        });
        assert!(format_gcp_error(&err).contains("temporarily unavailable"));
    }
}
