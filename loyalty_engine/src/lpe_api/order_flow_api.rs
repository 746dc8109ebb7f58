use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewWithdrawal, OrderNumber, Points},
    lpe_api::errors::OrderFlowError,
    traits::{InsertOrderResult, LoyaltyGatewayDatabase, WithdrawalResult},
};

/// `OrderFlowApi` is the primary API for the writes a user makes: uploading order numbers and withdrawing points.
///
/// Input is validated here, before the backend is touched.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: LoyaltyGatewayDatabase
{
    /// Submit an order number uploaded by a user.
    ///
    /// The number must pass the Luhn check. A new order is stored with status `NEW` and will be picked up by the next
    /// reconciliation cycle. Re-uploading an order is harmless, and the result tells the caller who owns it.
    pub async fn submit_order(&self, raw_number: &str, user_id: &str) -> Result<InsertOrderResult, OrderFlowError> {
        let number = OrderNumber::parse(raw_number)
            .map_err(|_| OrderFlowError::InvalidOrderNumber(raw_number.trim().to_string()))?;
        let result = self.db.store_order(&number, user_id).await?;
        match &result {
            InsertOrderResult::Inserted(_) => debug!("🔄️📦️ Order {number} accepted for user {user_id}"),
            InsertOrderResult::AlreadyLoadedBySameUser(_) => trace!("🔄️📦️ Order {number} was already loaded"),
            InsertOrderResult::ConflictWithOtherUser(_) => {
                info!("🔄️📦️ User {user_id} uploaded order {number}, which belongs to another user")
            },
        }
        Ok(result)
    }

    /// Spend `amount` points from the user's balance against the given order number.
    ///
    /// The withdrawal is only recorded if the user's live balance covers it.
    pub async fn withdraw(
        &self,
        user_id: &str,
        raw_number: &str,
        amount: Points,
    ) -> Result<WithdrawalResult, OrderFlowError> {
        let number = OrderNumber::parse(raw_number)
            .map_err(|_| OrderFlowError::InvalidOrderNumber(raw_number.trim().to_string()))?;
        if !amount.is_positive() {
            return Err(OrderFlowError::NonPositiveAmount);
        }
        let result = self.db.record_withdrawal(NewWithdrawal::new(user_id, number.clone(), amount)).await?;
        match &result {
            WithdrawalResult::Recorded(_) => debug!("🔄️💰️ {amount} withdrawn by {user_id} against {number}"),
            WithdrawalResult::InsufficientFunds => info!("🔄️💰️ {user_id} has insufficient funds to withdraw {amount}"),
            WithdrawalResult::AlreadyExists(_) => info!("🔄️💰️ A withdrawal against {number} has already been made"),
        }
        Ok(result)
    }
}
