//! Loyalty Engine
//!
//! The loyalty engine keeps track of the points users earn on their purchases. Users upload purchase-order numbers, an
//! external accrual service decides how many points each order earns, and users can spend those points by withdrawing
//! them against new orders. This library contains the core logic and is transport-agnostic.
//!
//! The library is divided into these main sections:
//! 1. Backend contracts ([`mod@traits`]) and a SQLite backend ([`SqliteDatabase`]). You should never need to access
//!    the database directly. Instead, use the public API provided by the engine. The exception is the data types used
//!    in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@lpe_api`]). This provides the public-facing functionality of the engine: accounts,
//!    registration, order and withdrawal handling, and the two background operations.
//!
//! ## Background operations
//! Two operations are meant to be run periodically by the host application:
//! * [`ReconciliationApi::run_cycle`] polls the accrual service for every order that has not reached a final status and
//!   writes the changes back in one batch.
//! * [`SettlementApi::settle`] folds newly accrued and withdrawn points into each user's balance snapshot.
//!
//! Balance reads never wait for either of them. They combine the last snapshot with everything that happened since.
pub mod db_types;
pub mod helpers;
pub mod lpe_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

pub use lpe_api::{
    accounts_api::AccountApi,
    auth_api::AuthApi,
    errors::{OrderFlowError, SettlementError},
    order_flow_api::OrderFlowApi,
    reconciliation_api::ReconciliationApi,
    settlement_api::SettlementApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AccountApiError,
    AccountManagement,
    AccrualError,
    AccrualLookup,
    AccrualReport,
    AccrualStatus,
    AuthApiError,
    AuthManagement,
    InsertOrderResult,
    LookupOutcome,
    LoyaltyGatewayDatabase,
    LoyaltyGatewayError,
    ReconciliationResult,
    SettlementResult,
    WithdrawalResult,
};
