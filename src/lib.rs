//! Pesapal Checkout Service
//!
//! A thin web front-end for the Pesapal v3 hosted payment gateway: checkout
//! form submission, order submission against the gateway, an IPN listener
//! for asynchronous status pushes, and an on-demand status poller. The
//! in-process transaction registry is the single source of truth for the
//! last-observed status of every order.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod registry;

use std::sync::Arc;

use axum::Router;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub registry: registry::TransactionRegistry,
    pub gateway: Arc<dyn gateway::PaymentGateway>,
}

/// Builds the application router with the given state attached.
pub fn app_router(state: AppState) -> Router {
    handlers::routes().with_state(state)
}
