use sqlx::SqliteConnection;

use super::now_ms;
use crate::db_types::{NewWithdrawal, Withdrawal};

/// Inserts the withdrawal if, and only if, the user's live balance (the snapshot plus all unfolded deltas) covers the
/// amount. The check and the insert are a single statement, so it is safe to call concurrently for the same user.
///
/// Returns `None` if the funds were insufficient. A withdrawal against an order number that has already been used
/// surfaces as a unique-constraint violation.
pub async fn insert_withdrawal_if_funded(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Option<Withdrawal>, sqlx::Error> {
    // Run the statement to completion so the insert is committed before the connection goes back to the pool.
    let inserted: Vec<Withdrawal> = sqlx::query_as(concat!(
        "INSERT INTO withdrawals (number, ts, customer, withdraw) SELECT $1, ",
        now_ms!(),
        r#", b.customer, $3
        FROM balances b
        WHERE b.customer = $2 AND
            b.balance
            + COALESCE((SELECT SUM(o.income) FROM orders o WHERE o.customer = b.customer AND o.ts > b.ts), 0)
            - COALESCE((SELECT SUM(w.withdraw) FROM withdrawals w WHERE w.customer = b.customer AND w.ts > b.ts), 0)
            >= $3
        RETURNING *
        "#
    ))
    .bind(withdrawal.number.as_str())
    .bind(withdrawal.customer)
    .bind(withdrawal.amount.value())
    .fetch_all(conn)
    .await?;
    Ok(inserted.into_iter().next())
}

/// Fetches all withdrawals made by the given user, newest first.
pub async fn fetch_withdrawals_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals =
        sqlx::query_as("SELECT * FROM withdrawals WHERE customer = $1 ORDER BY processed_at DESC, rowid DESC")
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(withdrawals)
}
