//! #  Backend contracts
//!
//! This module defines the interface contracts that storage backends and external collaborators must satisfy to be
//! driven by the loyalty engine.
//!
//! ## Users, orders and balances
//! A user uploads purchase-order numbers. The external accrual service decides whether an order earns points, and how
//! many. Points are tracked per user in a balance snapshot which is periodically brought up to date (folded) from the
//! order and withdrawal rows.
//!
//! ## Traits
//! * [`LoyaltyGatewayDatabase`] defines the highest level of behaviour for backends: storing orders and withdrawals,
//!   and the two background operations, status reconciliation and balance settlement.
//! * [`AuthManagement`] defines behaviour for registering users and looking up credentials.
//! * [`AccountManagement`] provides read-only queries for orders, withdrawals and balances.
//! * [`AccrualLookup`] is the contract for the external accrual service client.
mod account_management;
mod accrual_lookup;
mod auth_management;
mod data_objects;
mod loyalty_gateway_database;

pub use account_management::{AccountApiError, AccountManagement};
pub use accrual_lookup::{AccrualError, AccrualLookup, AccrualReport, AccrualStatus, LookupOutcome};
pub use auth_management::{AuthApiError, AuthManagement};
pub use data_objects::{InsertOrderResult, ReconciliationResult, SettlementResult, WithdrawalResult};
pub use loyalty_gateway_database::{LoyaltyGatewayDatabase, LoyaltyGatewayError};
