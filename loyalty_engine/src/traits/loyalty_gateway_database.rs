use thiserror::Error;

use crate::{
    db_types::{NewWithdrawal, OrderNumber, OrderStatusType, StatusUpdate},
    traits::{
        data_objects::{InsertOrderResult, WithdrawalResult},
        AccountApiError,
        AccountManagement,
    },
};

#[derive(Debug, Clone, Error)]
pub enum LoyaltyGatewayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Withdrawal amount must be positive")]
    NonPositiveWithdrawal,
    #[error("Account error: {0}")]
    AccountError(#[from] AccountApiError),
}

impl From<sqlx::Error> for LoyaltyGatewayError {
    fn from(e: sqlx::Error) -> Self {
        LoyaltyGatewayError::DatabaseError(e.to_string())
    }
}

/// This trait defines the highest level of behaviour for backends supporting the loyalty engine.
///
/// This behaviour includes:
/// * Storing newly uploaded orders, with the three-way ownership outcome.
/// * Recording withdrawals atomically against the live balance.
/// * The reconciliation read (orders pending a status update) and the batched status write.
/// * The set-based balance fold.
///
/// Every timestamp used for settlement is assigned by the backend at write time, never by the caller.
#[allow(async_fn_in_trait)]
pub trait LoyaltyGatewayDatabase: Clone + AccountManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a freshly uploaded order for `user_id` with status `NEW` and zero accrual.
    ///
    /// If the order number already exists, nothing is written and the result reports who owns it.
    async fn store_order(
        &self,
        number: &OrderNumber,
        user_id: &str,
    ) -> Result<InsertOrderResult, LoyaltyGatewayError>;

    /// Records a withdrawal if, and only if, the user's live balance covers the amount.
    ///
    /// The balance check and the insert are a single conditional statement, so two concurrent withdrawals can never
    /// overdraw the account.
    async fn record_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<WithdrawalResult, LoyaltyGatewayError>;

    /// Returns the number and current status of every order that is not in a terminal state, oldest upload first.
    async fn orders_pending_reconciliation(&self) -> Result<Vec<(OrderNumber, OrderStatusType)>, LoyaltyGatewayError>;

    /// Applies a batch of status changes in one atomic transaction. Either every row is updated, or none are.
    ///
    /// * Orders already in a terminal state are left untouched.
    /// * The accrual is only recorded for `PROCESSED` orders. It is stored as zero for every other status.
    /// * The order's `ts` is bumped to the store's current time, so the change is picked up by the next fold.
    ///
    /// An empty batch does not touch the database. Returns the number of rows changed.
    async fn apply_status_batch(&self, batch: &[StatusUpdate]) -> Result<u64, LoyaltyGatewayError>;

    /// Folds every order accrual and withdrawal newer than each user's watermark into the user's balance snapshot,
    /// in one statement covering all users.
    ///
    /// Returns the number of snapshots that changed. Running the fold twice with no new activity changes nothing.
    async fn fold_balances(&self) -> Result<u64, LoyaltyGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LoyaltyGatewayError> {
        Ok(())
    }
}
