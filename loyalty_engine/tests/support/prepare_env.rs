use std::time::Duration;

use log::*;
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatusType, Points, StatusUpdate, User},
    AuthApi,
    LoyaltyGatewayDatabase,
    SqliteDatabase,
};

/// Creates a fresh, migrated database in the system temp directory.
pub async fn prepare_test_env() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_path();
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("loyalty_test_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn register(db: &SqliteDatabase, username: &str) -> User {
    AuthApi::new(db.clone()).register_user(username, "$argon2id$fake").await.expect("Error registering user")
}

/// Stores the order and marks it as processed with the given accrual.
pub async fn accrue(db: &SqliteDatabase, user: &User, number: &str, points: i64) {
    let number = OrderNumber::from(number);
    db.store_order(&number, &user.id).await.expect("Error storing order");
    let update = StatusUpdate::new(number, OrderStatusType::Processed, Points::from_points(points));
    db.apply_status_batch(&[update]).await.expect("Error applying status update");
}

/// Order and withdrawal timestamps come from the database clock in milliseconds. A fold only picks up rows stamped
/// strictly before it, so give the clock a chance to move on.
pub async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

/// Appends the Luhn check digit to `payload`, giving a valid order number.
pub fn order_number(payload: u64) -> String {
    let digits = payload.to_string();
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| match i % 2 {
            0 if d * 2 > 9 => d * 2 - 9,
            0 => d * 2,
            _ => d,
        })
        .sum();
    format!("{digits}{}", (10 - sum % 10) % 10)
}
