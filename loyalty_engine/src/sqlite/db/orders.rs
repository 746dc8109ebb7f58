use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::now_ms;
use crate::db_types::{Order, OrderNumber, OrderStatusType, StatusUpdate};

/// SQLite caps the number of bound parameters per statement. Each status update binds three.
const STATUS_BATCH_CHUNK: usize = 500;

/// Inserts a new order with status `NEW` and zero accrual. Returns `None`, and changes nothing, if an order with the
/// same number already exists (for any user).
pub async fn insert_order(
    number: &OrderNumber,
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    // Drain the statement rather than stopping at the first row. SQLite only finishes the autocommit once the
    // statement has run to completion, and until then other connections won't see the new order.
    let orders: Vec<Order> = sqlx::query_as(concat!(
        "INSERT INTO orders (number, ts, customer, income, status) VALUES ($1, ",
        now_ms!(),
        ", $2, 0, 'NEW') ON CONFLICT (number) DO NOTHING RETURNING *"
    ))
    .bind(number.as_str())
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(orders.into_iter().next())
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches all orders uploaded by the given user, newest first.
pub async fn fetch_orders_for_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE customer = $1 ORDER BY uploaded_at DESC, rowid DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Fetches the number and status of every order that can still change, in upload order.
pub async fn fetch_pending_orders(
    conn: &mut SqliteConnection,
) -> Result<Vec<(OrderNumber, OrderStatusType)>, sqlx::Error> {
    let pending = sqlx::query_as(
        r#"
        SELECT number, status FROM orders
        WHERE status NOT IN ('INVALID', 'PROCESSED')
        ORDER BY uploaded_at, rowid
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(pending)
}

/// Writes a batch of status changes. This is not atomic on its own when the batch is larger than one chunk, so callers
/// should run it inside a transaction and pass `&mut *tx` as the connection argument.
///
/// Rows already in a terminal state are never rewritten. The accrual is only kept for `PROCESSED` orders, and every
/// updated row gets a fresh `ts`. Returns the number of rows that changed.
pub async fn update_order_statuses(batch: &[StatusUpdate], conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let mut updated = 0;
    for chunk in batch.chunks(STATUS_BATCH_CHUNK) {
        let mut builder = QueryBuilder::<Sqlite>::new("WITH batch (number, status, income) AS (");
        builder.push_values(chunk, |mut row, update| {
            row.push_bind(update.number.0.clone()).push_bind(update.status).push_bind(update.accrual.value());
        });
        builder.push(concat!(
            r#")
            UPDATE orders SET
                status = batch.status,
                income = CASE WHEN batch.status = 'PROCESSED' THEN batch.income ELSE 0 END,
                ts = "#,
            now_ms!(),
            r#"
            FROM batch
            WHERE orders.number = batch.number AND orders.status NOT IN ('INVALID', 'PROCESSED')
            "#
        ));
        let result = builder.build().execute(&mut *conn).await?;
        trace!("🗃️ Status chunk of {} updates changed {} rows", chunk.len(), result.rows_affected());
        updated += result.rows_affected();
    }
    debug!("🗃️ {updated} of {} order status updates applied", batch.len());
    Ok(updated)
}
