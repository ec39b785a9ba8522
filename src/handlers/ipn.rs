use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::ServiceError;
use crate::gateway::signature;
use crate::handlers::AppState;
use crate::models::OrderStatus;

/// Header carrying the notification signature: base64 HMAC-SHA256 of the raw
/// request body under the IPN shared secret.
pub const NOTIFICATION_HEADER: &str = "X-Pesapal-Notification";

#[derive(Debug, Deserialize)]
struct IpnNotification {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// POST /ipn — push notification from the gateway reporting an order's
/// status change. The signature is verified against the raw body before any
/// parsing; the supplied status is stored verbatim.
pub async fn ipn_listener(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let presented = headers
        .get(NOTIFICATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            ServiceError::Unauthorized(format!("missing {} header", NOTIFICATION_HEADER))
        })?;

    if !signature::verify_signature(state.config.ipn_secret(), &body, presented) {
        warn!("IPN signature verification failed");
        return Err(ServiceError::Unauthorized(
            "invalid notification signature".to_string(),
        ));
    }

    let notification: IpnNotification = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::BadRequest(format!("invalid json: {}", e)))?;

    let order_id = notification
        .order_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServiceError::BadRequest("order_id is required".to_string()))?;
    let status = notification
        .status
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::BadRequest("status is required".to_string()))?;

    match state
        .registry
        .update_status(&order_id, OrderStatus::from(status.as_str()))
    {
        Some(order) => {
            info!(order_id = %order.order_id, status = %order.status, "order status updated from IPN");
            Ok((StatusCode::OK, "OK"))
        }
        None => Err(ServiceError::NotFound(format!(
            "order {} not found",
            order_id
        ))),
    }
}
