use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{OrderRequest, PaymentGateway, SubmitOrderResponse, TransactionStatusResponse};
use crate::config::AppConfig;
use crate::errors::ServiceError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}

struct CachedToken {
    token: String,
    fetched_at: Instant,
}

/// HTTP client for the Pesapal v3 API.
///
/// Bearer tokens are cached for `token_ttl` and dropped when the gateway
/// rejects one, so every authenticated call uses a token that is fresh under
/// the configured policy. Transport errors and 5xx responses are retried
/// with exponential backoff up to `retry_attempts`; 4xx responses are not.
pub struct PesapalClient {
    http: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
    retry_attempts: u32,
    retry_base_delay: Duration,
    token_ttl: Duration,
    token_cache: RwLock<Option<CachedToken>>,
}

impl PesapalClient {
    pub fn new(config: &AppConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.gateway_timeout_secs))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.pesapal_api_url.trim_end_matches('/').to_string(),
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            retry_attempts: config.gateway_retry_attempts.max(1),
            retry_base_delay: Duration::from_millis(config.gateway_retry_base_delay_ms),
            token_ttl: Duration::from_secs(config.token_ttl_secs),
            token_cache: RwLock::new(None),
        })
    }

    /// Returns a cached token while it is fresh, re-fetching otherwise.
    async fn token(&self) -> Result<String, ServiceError> {
        if let Some(cached) = self.token_cache.read().await.as_ref() {
            if cached.fetched_at.elapsed() < self.token_ttl {
                return Ok(cached.token.clone());
            }
        }

        let token = self.fetch_token().await?;
        *self.token_cache.write().await = Some(CachedToken {
            token: token.clone(),
            fetched_at: Instant::now(),
        });
        Ok(token)
    }

    async fn invalidate_token(&self) {
        *self.token_cache.write().await = None;
    }

    async fn fetch_token(&self) -> Result<String, ServiceError> {
        let url = format!("{}/api/Auth/RequestToken", self.base_url);
        let payload = serde_json::json!({
            "consumer_key": self.consumer_key,
            "consumer_secret": self.consumer_secret,
        });

        let response = self
            .execute_with_retry(|| {
                self.http
                    .post(&url)
                    .header("Accept", "application/json")
                    .json(&payload)
            })
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status != StatusCode::OK {
            // Bad credentials are request-blocking but never retried.
            warn!(%status, "token request rejected by gateway");
            return Err(ServiceError::AuthError(format!(
                "token request failed with status {}: {}",
                status, body
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceError::AuthError(format!("malformed token response: {}", e)))?;
        parsed
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ServiceError::AuthError(format!("token missing from gateway response: {}", body))
            })
    }

    /// Sends a request, retrying transport errors and 5xx responses with
    /// exponential backoff. The final outcome is returned as-is; status
    /// interpretation belongs to the caller.
    async fn execute_with_retry<F>(&self, build: F) -> Result<reqwest::Response, ServiceError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 1u32;
        loop {
            match build().send().await {
                Ok(response) => {
                    if response.status().is_server_error() && attempt < self.retry_attempts {
                        warn!(
                            status = %response.status(),
                            attempt,
                            max_attempts = self.retry_attempts,
                            "gateway returned server error, retrying"
                        );
                    } else {
                        return Ok(response);
                    }
                }
                Err(err) if attempt < self.retry_attempts => {
                    warn!(
                        error = %err,
                        attempt,
                        max_attempts = self.retry_attempts,
                        "gateway call failed, retrying"
                    );
                }
                Err(err) => {
                    return Err(ServiceError::GatewayError(format!(
                        "gateway unreachable after {} attempts: {}",
                        attempt, err
                    )));
                }
            }

            let backoff = self.retry_base_delay * 2u32.saturating_pow(attempt - 1);
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl PaymentGateway for PesapalClient {
    async fn request_token(&self) -> Result<String, ServiceError> {
        self.token().await
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<SubmitOrderResponse, ServiceError> {
        let token = self.token().await?;
        let url = format!("{}/api/Transactions/SubmitOrderRequest", self.base_url);

        debug!(order_id = %order.id, "submitting order to gateway");
        let response = self
            .execute_with_retry(|| {
                self.http
                    .post(&url)
                    .header("Accept", "application/json")
                    .bearer_auth(&token)
                    .json(order)
            })
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::AuthError(format!(
                "gateway rejected bearer token: {}",
                body
            )));
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::GatewayError(format!(
                "SubmitOrderRequest returned status {}: {}",
                status, body
            )));
        }

        let parsed: SubmitOrderResponse = response.json().await.map_err(|e| {
            ServiceError::GatewayError(format!("malformed submit-order response: {}", e))
        })?;
        info!(order_id = %order.id, has_redirect = parsed.redirect_url.is_some(), "order submitted");
        Ok(parsed)
    }

    async fn transaction_status(
        &self,
        order_id: &str,
    ) -> Result<TransactionStatusResponse, ServiceError> {
        let token = self.token().await?;
        let url = format!("{}/api/Transactions/GetTransactionStatus", self.base_url);

        let response = self
            .execute_with_retry(|| {
                self.http
                    .get(&url)
                    .query(&[("orderTrackingId", order_id)])
                    .header("Accept", "application/json")
                    .bearer_auth(&token)
            })
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::AuthError(format!(
                "gateway rejected bearer token: {}",
                body
            )));
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::GatewayError(format!(
                "GetTransactionStatus returned status {}: {}",
                status, body
            )));
        }

        response.json().await.map_err(|e| {
            ServiceError::GatewayError(format!("malformed transaction-status response: {}", e))
        })
    }
}
