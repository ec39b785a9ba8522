//! Minimal server-rendered pages for the checkout form, error, and status
//! views. Kept deliberately small; a real deployment would swap in a
//! template engine without touching the handlers' contracts.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::models::Order;

/// Escapes user-influenced text before interpolation into HTML.
fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n{body}\n</body>\n</html>",
    ))
}

/// The checkout form served at `GET /`.
pub fn checkout_form() -> Html<String> {
    layout(
        "Checkout",
        r#"<h1>Checkout</h1>
<form action="/checkout" method="post">
  <label>Amount <input type="text" name="amount" required></label><br>
  <label>Description <input type="text" name="description" required></label><br>
  <label>Email <input type="email" name="email"></label><br>
  <label>Phone <input type="text" name="phone"></label><br>
  <label>First name <input type="text" name="firstname"></label><br>
  <label>Last name <input type="text" name="lastname"></label><br>
  <button type="submit">Pay now</button>
</form>"#,
    )
}

/// Error page carrying a diagnostic message, rendered with the given status.
pub fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<h1>Payment error</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to checkout</a></p>",
        escape(message)
    );
    (status, layout("Payment error", &body)).into_response()
}

/// Status page for a known order.
pub fn status_page(order: &Order) -> Html<String> {
    let body = format!(
        "<h1>Transaction status</h1>\n<dl>\n<dt>Order</dt><dd>{}</dd>\n<dt>Description</dt><dd>{}</dd>\n<dt>Amount</dt><dd>{} {}</dd>\n<dt>Status</dt><dd>{}</dd>\n<dt>Created</dt><dd>{}</dd>\n</dl>",
        escape(&order.order_id),
        escape(&order.description),
        order.amount,
        escape(&order.currency),
        escape(order.status.as_str()),
        order.created_at.to_rfc3339(),
    );
    layout("Transaction status", &body)
}
