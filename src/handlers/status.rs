use axum::{
    extract::{Path, State},
    response::Html,
};
use tracing::info;

use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::models::OrderStatus;
use crate::pages;

/// GET /test_auth — diagnostic endpoint exercising token acquisition. Always
/// answers 200 with either a truncated token or failure text.
pub async fn test_auth(State(state): State<AppState>) -> String {
    match state.gateway.request_token().await {
        Ok(token) => {
            let shown: String = token.chars().take(10).collect();
            format!("Authentication successful. Token: {}...", shown)
        }
        Err(_) => "Authentication failed. Check your API credentials.".to_string(),
    }
}

/// GET /transaction_status/:order_id — re-queries the gateway for a known
/// order, refreshes the registry, and renders the status page.
///
/// 404 for unknown orders; 503 when no token is obtainable; 500 when the
/// gateway query fails (both via the error taxonomy's status mapping).
pub async fn transaction_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Html<String>, ServiceError> {
    if !state.registry.contains(&order_id) {
        return Err(ServiceError::NotFound(format!(
            "order {} not found",
            order_id
        )));
    }

    let response = state.gateway.transaction_status(&order_id).await?;
    let status = response
        .status
        .map(|s| OrderStatus::from(s.as_str()))
        .unwrap_or(OrderStatus::Unknown);

    let order = state
        .registry
        .update_status(&order_id, status)
        .ok_or_else(|| ServiceError::NotFound(format!("order {} not found", order_id)))?;

    info!(order_id = %order.order_id, status = %order.status, "order status refreshed from gateway");
    Ok(pages::status_page(&order))
}
