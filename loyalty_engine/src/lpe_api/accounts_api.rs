//! Unifies API for accessing user accounts.

use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{BalanceSnapshot, Order, UserBalance, Withdrawal},
    traits::{AccountApiError, AccountManagement},
};

/// The `AccountApi` provides a unified API for accessing accounts.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches all orders uploaded by the user, newest first.
    pub async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AccountApiError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        trace!("{} orders found for user {user_id}", orders.len());
        Ok(orders)
    }

    /// Fetches all withdrawals made by the user, newest first.
    pub async fn withdrawals_for_user(&self, user_id: &str) -> Result<Vec<Withdrawal>, AccountApiError> {
        self.db.fetch_withdrawals_for_user(user_id).await
    }

    /// The user's current balance, including everything that has happened since the last settlement.
    pub async fn balance_for_user(&self, user_id: &str) -> Result<UserBalance, AccountApiError> {
        self.db.fetch_balance(user_id).await
    }

    pub async fn snapshot_for_user(&self, user_id: &str) -> Result<Option<BalanceSnapshot>, AccountApiError> {
        self.db.fetch_balance_snapshot(user_id).await
    }
}
