use std::time::Duration;

use thiserror::Error;

use crate::traits::LoyaltyGatewayError;

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("'{0}' is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("Withdrawal amount must be positive")]
    NonPositiveAmount,
    #[error("{0}")]
    DatabaseError(#[from] LoyaltyGatewayError),
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Balance settlement did not complete within {0:?}")]
    TimedOut(Duration),
    #[error("{0}")]
    DatabaseError(#[from] LoyaltyGatewayError),
}
