use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::ServiceError;
use crate::gateway::OrderRequest;
use crate::handlers::AppState;
use crate::models::{BillingContact, Order};
use crate::pages;

#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub amount: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

/// GET / — the checkout form.
pub async fn index() -> Html<String> {
    pages::checkout_form()
}

/// POST /checkout — validates the form, records a pending order, submits it
/// to the gateway, and redirects the customer to the hosted payment page.
pub async fn submit_checkout(
    State(state): State<AppState>,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, ServiceError> {
    let amount = parse_amount(form.amount.as_deref())?;
    let description = form
        .description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ServiceError::ValidationError("description is required".to_string()))?;

    let billing = BillingContact {
        email_address: form.email.unwrap_or_default(),
        phone_number: form.phone.unwrap_or_default(),
        first_name: form.firstname.unwrap_or_default(),
        last_name: form.lastname.unwrap_or_default(),
    };

    let order = Order::new(
        amount,
        description.clone(),
        state.config.currency.clone(),
        billing.clone(),
    );
    let order_id = order.order_id.clone();

    // Record the order before contacting the gateway so a crash mid-flow
    // still leaves a traceable PENDING entry.
    state.registry.insert(order);
    info!(order_id = %order_id, amount, "recorded pending order");

    let request = OrderRequest {
        id: order_id.clone(),
        currency: state.config.currency.clone(),
        amount: amount as f64,
        description,
        callback_url: state.config.callback_url.clone(),
        notification_id: state.config.notification_id.clone(),
        billing_address: billing,
    };

    // Submission failures leave the order PENDING: it was recorded but never
    // confirmed either way by the gateway.
    match state.gateway.submit_order(&request).await {
        Ok(response) => match response.redirect_url.filter(|u| !u.is_empty()) {
            Some(url) => {
                info!(order_id = %order_id, "redirecting customer to gateway payment page");
                Ok(Redirect::to(&url).into_response())
            }
            None => {
                warn!(order_id = %order_id, "gateway accepted order without a redirect URL");
                Ok(pages::error_page(
                    StatusCode::BAD_GATEWAY,
                    "Payment gateway did not return a redirect URL.",
                ))
            }
        },
        Err(ServiceError::AuthError(msg)) => {
            error!(order_id = %order_id, error = %msg, "could not obtain gateway token");
            Ok(pages::error_page(
                StatusCode::SERVICE_UNAVAILABLE,
                "Could not obtain authentication token. Check API credentials.",
            ))
        }
        Err(ServiceError::GatewayError(msg)) => {
            error!(order_id = %order_id, error = %msg, "order submission failed");
            Ok(pages::error_page(
                StatusCode::BAD_GATEWAY,
                &format!("Payment error: {}", msg),
            ))
        }
        Err(other) => Err(other),
    }
}

/// The checkout contract accepts whole currency units only: a non-empty,
/// digits-only amount field.
fn parse_amount(raw: Option<&str>) -> Result<u64, ServiceError> {
    let raw = raw
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ServiceError::ValidationError("amount is required".to_string()))?;
    if !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServiceError::ValidationError(
            "amount must contain digits only".to_string(),
        ));
    }
    raw.parse::<u64>()
        .map_err(|_| ServiceError::ValidationError("amount is out of range".to_string()))
}
