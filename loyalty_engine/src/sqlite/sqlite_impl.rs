//! `SqliteDatabase` is a concrete implementation of a loyalty engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{balances, new_pool, orders, users, withdrawals};
use crate::{
    db_types::{
        BalanceSnapshot,
        NewUser,
        NewWithdrawal,
        Order,
        OrderNumber,
        OrderStatusType,
        StatusUpdate,
        User,
        UserBalance,
        Withdrawal,
    },
    traits::{
        AccountApiError,
        AccountManagement,
        AuthApiError,
        AuthManagement,
        InsertOrderResult,
        LoyaltyGatewayDatabase,
        LoyaltyGatewayError,
        WithdrawalResult,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, creating the database file if it does not exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Created SQLite connection pool for {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date with the migrations embedded in this crate.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete for {}", self.url);
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl LoyaltyGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn store_order(&self, number: &OrderNumber, user_id: &str) -> Result<InsertOrderResult, LoyaltyGatewayError> {
        let mut conn = self.pool.acquire().await?;
        if let Some(order) = orders::insert_order(number, user_id, &mut conn).await? {
            debug!("🗃️ Order {number} has been saved for user {user_id}");
            return Ok(InsertOrderResult::Inserted(order));
        }
        // Orders are never deleted, so the conflicting row is still there.
        let existing = orders::fetch_order_by_number(number, &mut conn)
            .await?
            .ok_or_else(|| LoyaltyGatewayError::DatabaseError(format!("Order {number} vanished after a conflict")))?;
        if existing.customer == user_id {
            trace!("🗃️ Order {number} was already uploaded by {user_id}");
            Ok(InsertOrderResult::AlreadyLoadedBySameUser(existing))
        } else {
            debug!("🗃️ User {user_id} tried to upload order {number}, which belongs to another user");
            Ok(InsertOrderResult::ConflictWithOtherUser(existing.number))
        }
    }

    async fn record_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<WithdrawalResult, LoyaltyGatewayError> {
        if !withdrawal.amount.is_positive() {
            return Err(LoyaltyGatewayError::NonPositiveWithdrawal);
        }
        let number = withdrawal.number.clone();
        let mut conn = self.pool.acquire().await?;
        match withdrawals::insert_withdrawal_if_funded(withdrawal, &mut conn).await {
            Ok(Some(w)) => {
                debug!("🗃️ Withdrawal of {} against {number} recorded for {}", w.amount, w.customer);
                Ok(WithdrawalResult::Recorded(w))
            },
            Ok(None) => Ok(WithdrawalResult::InsufficientFunds),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(WithdrawalResult::AlreadyExists(number)),
            Err(e) => Err(e.into()),
        }
    }

    async fn orders_pending_reconciliation(&self) -> Result<Vec<(OrderNumber, OrderStatusType)>, LoyaltyGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let pending = orders::fetch_pending_orders(&mut conn).await?;
        Ok(pending)
    }

    async fn apply_status_batch(&self, batch: &[StatusUpdate]) -> Result<u64, LoyaltyGatewayError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let updated = orders::update_order_statuses(batch, &mut tx).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn fold_balances(&self) -> Result<u64, LoyaltyGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let moved = balances::fold_all(&mut conn).await?;
        Ok(moved)
    }

    async fn close(&mut self) -> Result<(), LoyaltyGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_withdrawals_for_user(&self, user_id: &str) -> Result<Vec<Withdrawal>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await?;
        Ok(withdrawals)
    }

    async fn fetch_balance(&self, user_id: &str) -> Result<UserBalance, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        balances::fetch_live_balance(user_id, &mut conn)
            .await?
            .ok_or_else(|| AccountApiError::BalanceNotFound(user_id.to_string()))
    }

    async fn fetch_balance_snapshot(&self, user_id: &str) -> Result<Option<BalanceSnapshot>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let snapshot = balances::fetch_snapshot(user_id, &mut conn).await?;
        Ok(snapshot)
    }
}

impl AuthManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, &mut tx).await?;
        users::insert_balance_row(&user.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ User {} created with id {}", user.username, user.id);
        Ok(user)
    }

    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_username(username, &mut conn).await?;
        Ok(user)
    }
}
