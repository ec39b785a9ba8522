//! Client for the Pesapal v3 payment gateway.
//!
//! Three authenticated operations are consumed: token acquisition, order
//! submission, and transaction-status lookup. The client caches the bearer
//! token with a TTL and applies a bounded retry policy to transient
//! failures; authentication rejections are never retried.

pub mod client;
pub mod signature;

pub use client::PesapalClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::models::BillingContact;

/// Payload for `POST /api/Transactions/SubmitOrderRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub id: String,
    pub currency: String,
    pub amount: f64,
    pub description: String,
    pub callback_url: String,
    pub notification_id: String,
    pub billing_address: BillingContact,
}

/// Successful response body from order submission. The gateway omits fields
/// freely, so everything is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitOrderResponse {
    #[serde(default)]
    pub order_tracking_id: Option<String>,
    #[serde(default)]
    pub merchant_reference: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Response body from a transaction-status query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionStatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Outbound operations against the payment gateway. Handlers depend on this
/// trait so tests can substitute a stub gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Returns a bearer token valid for subsequent gateway calls.
    async fn request_token(&self) -> Result<String, ServiceError>;

    /// Submits an order for hosted-page payment. The caller must have
    /// recorded the order before invoking this.
    async fn submit_order(&self, order: &OrderRequest) -> Result<SubmitOrderResponse, ServiceError>;

    /// Queries the gateway for an order's current status.
    async fn transaction_status(
        &self,
        order_id: &str,
    ) -> Result<TransactionStatusResponse, ServiceError>;
}
