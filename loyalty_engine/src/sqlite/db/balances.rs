use sqlx::SqliteConnection;

use super::now_ms;
use crate::db_types::{BalanceSnapshot, UserBalance};

/// Fetches the folded balance snapshot for the user, without any of the unfolded deltas.
pub async fn fetch_snapshot(user_id: &str, conn: &mut SqliteConnection) -> Result<Option<BalanceSnapshot>, sqlx::Error> {
    let snapshot = sqlx::query_as("SELECT balance, total_withdraw, ts FROM balances WHERE customer = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(snapshot)
}

/// Fetches the live balance for the user: the snapshot plus every accrual and withdrawal newer than its watermark.
pub async fn fetch_live_balance(user_id: &str, conn: &mut SqliteConnection) -> Result<Option<UserBalance>, sqlx::Error> {
    let balance = sqlx::query_as(
        r#"
        SELECT
            CAST(b.balance + u.accrued - u.withdrawn AS INTEGER) AS current,
            CAST(b.total_withdraw + u.withdrawn AS INTEGER) AS withdrawn
        FROM balances b, (
            SELECT
                COALESCE((SELECT SUM(o.income) FROM orders o, balances s
                    WHERE s.customer = $1 AND o.customer = s.customer AND o.ts > s.ts), 0) AS accrued,
                COALESCE((SELECT SUM(w.withdraw) FROM withdrawals w, balances s
                    WHERE s.customer = $1 AND w.customer = s.customer AND w.ts > s.ts), 0) AS withdrawn
        ) u
        WHERE b.customer = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(balance)
}

/// Folds every order accrual and withdrawal with `watermark < ts < now` into the owning user's snapshot, for all users
/// in a single statement. The watermark moves to the newest contributing `ts`, so it never goes backwards.
///
/// Rows stamped in the same millisecond as the fold itself are left for the next fold. Any row committed after this
/// statement is stamped at or after `now`, so it can never end up at or below the new watermark without being counted.
///
/// Returns the number of snapshots that changed.
pub async fn fold_all(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(concat!(
        r#"
        WITH clock (now) AS (SELECT "#,
        now_ms!(),
        r#"),
        deltas AS (
            SELECT
                b.customer AS customer,
                COALESCE((
                    SELECT SUM(o.income) FROM orders o, clock
                    WHERE o.customer = b.customer AND o.ts > b.ts AND o.ts < clock.now
                ), 0) AS accrued,
                COALESCE((
                    SELECT SUM(w.withdraw) FROM withdrawals w, clock
                    WHERE w.customer = b.customer AND w.ts > b.ts AND w.ts < clock.now
                ), 0) AS withdrawn,
                MAX(
                    COALESCE((
                        SELECT MAX(o.ts) FROM orders o, clock
                        WHERE o.customer = b.customer AND o.ts > b.ts AND o.ts < clock.now
                    ), 0),
                    COALESCE((
                        SELECT MAX(w.ts) FROM withdrawals w, clock
                        WHERE w.customer = b.customer AND w.ts > b.ts AND w.ts < clock.now
                    ), 0)
                ) AS newest
            FROM balances b
        )
        UPDATE balances SET
            balance = balances.balance + deltas.accrued - deltas.withdrawn,
            total_withdraw = balances.total_withdraw + deltas.withdrawn,
            ts = deltas.newest
        FROM deltas
        WHERE balances.customer = deltas.customer AND deltas.newest > balances.ts
        "#
    ))
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
