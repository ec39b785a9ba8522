use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix for client-generated order identifiers.
const ORDER_ID_PREFIX: &str = "ORDER-";
/// Hex characters of randomness in an order identifier (40 bits).
const ORDER_ID_SUFFIX_LEN: usize = 10;

/// Last-observed state of an order. Well-known gateway values normalize to
/// named variants; anything else is preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
    Unknown,
    Other(String),
}

impl From<&str> for OrderStatus {
    fn from(value: &str) -> Self {
        match value {
            "PENDING" => OrderStatus::Pending,
            "COMPLETED" => OrderStatus::Completed,
            "FAILED" => OrderStatus::Failed,
            "UNKNOWN" => OrderStatus::Unknown,
            other => OrderStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        OrderStatus::from(value.as_str())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Unknown => "UNKNOWN",
            OrderStatus::Other(value) => value,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing contact fields forwarded to the gateway. All optional; empty
/// strings serialize as-is, matching the gateway's billing_address object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingContact {
    pub email_address: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
}

/// One checkout attempt as recorded in the transaction registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub amount: u64,
    pub description: String,
    pub currency: String,
    pub billing: BillingContact,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order with a fresh identifier. The identifier
    /// is assigned here, before the gateway is ever contacted, and is never
    /// reused.
    pub fn new(amount: u64, description: String, currency: String, billing: BillingContact) -> Self {
        Self {
            order_id: generate_order_id(),
            amount,
            description,
            currency,
            billing,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Generates a unique order identifier: fixed prefix plus 10 hex chars of a
/// v4 UUID. 40 bits of randomness makes collisions negligible at the volumes
/// a single checkout front-end sees.
pub fn generate_order_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}{}", ORDER_ID_PREFIX, &hex[..ORDER_ID_SUFFIX_LEN])
}
