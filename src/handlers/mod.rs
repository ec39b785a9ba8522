pub mod checkout;
pub mod ipn;
pub mod status;

use axum::{
    routing::{get, post},
    Router,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// All application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::index))
        .route("/checkout", post(checkout::submit_checkout))
        .route("/test_auth", get(status::test_auth))
        .route("/ipn", post(ipn::ipn_listener))
        .route("/transaction_status/:order_id", get(status::transaction_status))
}
