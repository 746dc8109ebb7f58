use loyalty_engine::{
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
        AccrualError,
        AccrualLookup,
        AuthApiError,
        AuthManagement,
        InsertOrderResult,
        LoyaltyGatewayDatabase,
        LookupOutcome,
        LoyaltyGatewayError,
        WithdrawalResult,
    },
};
use mockall::mock;

mock! {
    pub AccountManager {}
    impl AccountManagement for AccountManager {
        async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AccountApiError>;
        async fn fetch_withdrawals_for_user(&self, user_id: &str) -> Result<Vec<Withdrawal>, AccountApiError>;
        async fn fetch_balance(&self, user_id: &str) -> Result<UserBalance, AccountApiError>;
        async fn fetch_balance_snapshot(&self, user_id: &str) -> Result<Option<BalanceSnapshot>, AccountApiError>;
    }
}

mock! {
    pub AuthManager {}
    impl AuthManagement for AuthManager {
        async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError>;
        async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, AuthApiError>;
    }
}

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl AccountManagement for Gateway {
        async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AccountApiError>;
        async fn fetch_withdrawals_for_user(&self, user_id: &str) -> Result<Vec<Withdrawal>, AccountApiError>;
        async fn fetch_balance(&self, user_id: &str) -> Result<UserBalance, AccountApiError>;
        async fn fetch_balance_snapshot(&self, user_id: &str) -> Result<Option<BalanceSnapshot>, AccountApiError>;
    }
    impl LoyaltyGatewayDatabase for Gateway {
        fn url(&self) -> &str;
        async fn store_order(&self, number: &OrderNumber, user_id: &str) -> Result<InsertOrderResult, LoyaltyGatewayError>;
        async fn record_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<WithdrawalResult, LoyaltyGatewayError>;
        async fn orders_pending_reconciliation(&self) -> Result<Vec<(OrderNumber, OrderStatusType)>, LoyaltyGatewayError>;
        async fn apply_status_batch(&self, batch: &[StatusUpdate]) -> Result<u64, LoyaltyGatewayError>;
        async fn fold_balances(&self) -> Result<u64, LoyaltyGatewayError>;
    }
}

mock! {
    pub Accrual {}
    impl AccrualLookup for Accrual {
        async fn lookup(&self, number: &OrderNumber) -> Result<LookupOutcome, AccrualError>;
    }
}
