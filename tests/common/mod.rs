use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt;

use pesapal_checkout::{
    config::AppConfig,
    errors::ServiceError,
    gateway::{signature, OrderRequest, PaymentGateway, SubmitOrderResponse, TransactionStatusResponse},
    registry::TransactionRegistry,
    AppState,
};

pub const TEST_IPN_SECRET: &str = "test-consumer-secret";

/// Scripted behavior for the stub gateway.
#[derive(Clone)]
pub enum TokenBehavior {
    Ok(String),
    Fail,
}

#[derive(Clone)]
pub enum SubmitBehavior {
    Redirect(String),
    NoRedirect,
    Error(String),
}

#[derive(Clone)]
pub enum StatusBehavior {
    Status(Option<String>),
    Error(String),
}

/// In-memory stand-in for the Pesapal gateway. Records submitted orders so
/// tests can observe what went over the wire.
pub struct StubGateway {
    pub token: Mutex<TokenBehavior>,
    pub submit: Mutex<SubmitBehavior>,
    pub status: Mutex<StatusBehavior>,
    pub submitted: Mutex<Vec<OrderRequest>>,
    pub token_calls: AtomicUsize,
}

impl Default for StubGateway {
    fn default() -> Self {
        Self {
            token: Mutex::new(TokenBehavior::Ok("stub-token-0123456789".to_string())),
            submit: Mutex::new(SubmitBehavior::Redirect(
                "https://pay.example.test/hosted/abc".to_string(),
            )),
            status: Mutex::new(StatusBehavior::Status(Some("COMPLETED".to_string()))),
            submitted: Mutex::new(Vec::new()),
            token_calls: AtomicUsize::new(0),
        }
    }
}

impl StubGateway {
    pub fn set_token(&self, behavior: TokenBehavior) {
        *self.token.lock().unwrap() = behavior;
    }

    pub fn set_submit(&self, behavior: SubmitBehavior) {
        *self.submit.lock().unwrap() = behavior;
    }

    pub fn set_status(&self, behavior: StatusBehavior) {
        *self.status.lock().unwrap() = behavior;
    }

    pub fn submitted_order_ids(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .map(|order| order.id.clone())
            .collect()
    }

    fn token_result(&self) -> Result<String, ServiceError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        match self.token.lock().unwrap().clone() {
            TokenBehavior::Ok(token) => Ok(token),
            TokenBehavior::Fail => Err(ServiceError::AuthError(
                "token request failed with status 401: bad credentials".to_string(),
            )),
        }
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn request_token(&self) -> Result<String, ServiceError> {
        self.token_result()
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<SubmitOrderResponse, ServiceError> {
        self.token_result()?;
        self.submitted.lock().unwrap().push(order.clone());
        match self.submit.lock().unwrap().clone() {
            SubmitBehavior::Redirect(url) => Ok(SubmitOrderResponse {
                order_tracking_id: Some(order.id.clone()),
                merchant_reference: Some(order.id.clone()),
                redirect_url: Some(url),
                status: Some("200".to_string()),
            }),
            SubmitBehavior::NoRedirect => Ok(SubmitOrderResponse {
                order_tracking_id: Some(order.id.clone()),
                merchant_reference: Some(order.id.clone()),
                redirect_url: None,
                status: Some("200".to_string()),
            }),
            SubmitBehavior::Error(msg) => Err(ServiceError::GatewayError(msg)),
        }
    }

    async fn transaction_status(
        &self,
        _order_id: &str,
    ) -> Result<TransactionStatusResponse, ServiceError> {
        self.token_result()?;
        match self.status.lock().unwrap().clone() {
            StatusBehavior::Status(status) => Ok(TransactionStatusResponse {
                status,
                payment_method: None,
                amount: None,
            }),
            StatusBehavior::Error(msg) => Err(ServiceError::GatewayError(msg)),
        }
    }
}

/// Helper harness wiring the router to a stub gateway and a fresh registry.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub gateway: Arc<StubGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let gateway = Arc::new(StubGateway::default());
        let state = AppState {
            config,
            registry: TransactionRegistry::new(),
            gateway: gateway.clone(),
        };
        let router = pesapal_checkout::app_router(state.clone());
        Self {
            router,
            state,
            gateway,
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Response {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v.replace(' ', "+")))
            .collect::<Vec<_>>()
            .join("&");
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    /// POST a raw body with optional extra headers (used by IPN tests).
    pub async fn post_raw(&self, path: &str, body: &str, headers: &[(&str, &str)]) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body.to_string())).expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    /// POST an IPN body carrying a valid signature header.
    pub async fn post_signed_ipn(&self, body: &str) -> Response {
        let sig = signature::sign_payload(TEST_IPN_SECRET, body.as_bytes());
        self.post_raw("/ipn", body, &[("X-Pesapal-Notification", sig.as_str())])
            .await
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "debug".to_string(),
        log_json: false,
        pesapal_api_url: "http://gateway.invalid".to_string(),
        consumer_key: "test-consumer-key".to_string(),
        consumer_secret: TEST_IPN_SECRET.to_string(),
        callback_url: "http://localhost:8080/transaction_status".to_string(),
        notification_id: "ipn-test-id".to_string(),
        currency: "RWF".to_string(),
        ipn_secret: None,
        gateway_timeout_secs: 2,
        gateway_retry_attempts: 3,
        gateway_retry_base_delay_ms: 10,
        token_ttl_secs: 240,
    }
}

pub async fn response_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

/// Asserts the response is a redirect and returns its Location target.
pub fn redirect_location(response: &Response) -> String {
    assert!(
        response.status() == StatusCode::SEE_OTHER || response.status() == StatusCode::FOUND,
        "expected redirect, got {}",
        response.status()
    );
    response
        .headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .expect("Location value")
        .to_string()
}
