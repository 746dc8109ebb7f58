use thiserror::Error;

use crate::db_types::{BalanceSnapshot, Order, UserBalance, Withdrawal};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("There is no balance record for user {0}")]
    BalanceNotFound(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// The `AccountManagement` trait defines read-only queries against a user's account: their orders, their
/// withdrawals and their points balance.
///
/// Implementations must not cache anything. Every call re-reads the backing store.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Fetches all orders uploaded by the user, most recently uploaded first.
    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AccountApiError>;

    /// Fetches all withdrawals made by the user, most recent first.
    async fn fetch_withdrawals_for_user(&self, user_id: &str) -> Result<Vec<Withdrawal>, AccountApiError>;

    /// Returns the live balance for the user.
    ///
    /// This is the folded snapshot plus every order accrual and withdrawal that is newer than the snapshot's
    /// watermark, computed in a single read. A read therefore never misses an accrual that was committed after the last
    /// fold.
    ///
    /// Returns [`AccountApiError::BalanceNotFound`] if the user does not exist.
    async fn fetch_balance(&self, user_id: &str) -> Result<UserBalance, AccountApiError>;

    /// Returns the raw folded snapshot for the user, without any unfolded deltas.
    async fn fetch_balance_snapshot(&self, user_id: &str) -> Result<Option<BalanceSnapshot>, AccountApiError>;
}
