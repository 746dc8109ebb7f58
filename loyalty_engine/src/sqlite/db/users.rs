use log::debug;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::now_ms;
use crate::{
    db_types::{NewUser, User},
    traits::AuthApiError,
};

/// Inserts a new user with a freshly generated id. This is not atomic on its own. Call it inside the same transaction
/// as [`insert_balance_row`] so that a user never exists without a balance snapshot.
pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AuthApiError> {
    let id = Uuid::new_v4().to_string();
    let result = sqlx::query_as("INSERT INTO users (id, username, pwdhash) VALUES ($1, $2, $3) RETURNING *")
        .bind(id)
        .bind(user.username.as_str())
        .bind(user.password_hash)
        .fetch_one(conn)
        .await;
    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            debug!("🗃️ Username {} is already taken", user.username);
            Err(AuthApiError::UsernameTaken(user.username))
        },
        Err(e) => Err(e.into()),
    }
}

/// Creates the zeroed balance snapshot for a new user.
///
/// The watermark starts one millisecond before the current database time. Every order and withdrawal for the user is
/// written after this row, so all of them are strictly newer than the initial watermark.
pub async fn insert_balance_row(user_id: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(concat!(
        "INSERT INTO balances (customer, ts, balance, total_withdraw) VALUES ($1, ",
        now_ms!(),
        " - 1, 0, 0)"
    ))
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_user_by_username(username: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE username = $1").bind(username).fetch_optional(conn).await?;
    Ok(user)
}
