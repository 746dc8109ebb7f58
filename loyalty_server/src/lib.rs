//! # Loyalty points gateway server
//! This crate hosts the HTTP server and the background workers for the loyalty points gateway. It is responsible for:
//! * Registering and authenticating users.
//! * Accepting purchase-order numbers uploaded by users, and withdrawals of points against new orders.
//! * Polling the external accrual service for the status of unfinished orders ([`reconciliation_worker`]).
//! * Periodically folding accrued and withdrawn points into balance snapshots ([`settlement_worker`]).
//!
//! ## Configuration
//! The server is configured via environment variables, some of which can be overridden on the command line. See
//! [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/user/register`, `/api/user/login`: Create an account, or log in. Both return a session token.
//! * `/api/user/orders`: Upload an order number (`POST`) or list your orders (`GET`).
//! * `/api/user/balance`: Your current and withdrawn points.
//! * `/api/user/balance/withdraw`: Spend points against an order.
//! * `/api/user/withdrawals`: List your withdrawals.

pub mod accrual_client;
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod reconciliation_worker;
pub mod routes;
pub mod server;
pub mod settlement_worker;

#[cfg(test)]
mod endpoint_tests;
