//! # Loyalty engine public API
//!
//! The `lpe_api` module exposes the programmatic API for the loyalty engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`accounts_api`] provides read access to a user's orders, withdrawals and balance.
//! * [`auth_api`] registers users and looks up their stored credentials.
//! * [`order_flow_api`] validates and stores newly uploaded orders and withdrawal requests.
//! * [`reconciliation_api`] runs one cycle of the order status reconciliation loop against the accrual service.
//! * [`settlement_api`] runs one balance fold.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use loyalty_engine::{AccountApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements AccountManagement
//! let api = AccountApi::new(db);
//! let balance = api.balance_for_user(&user_id).await?;
//! ```

pub mod accounts_api;
pub mod auth_api;
pub mod errors;
pub mod order_flow_api;
pub mod reconciliation_api;
pub mod settlement_api;
