use sqlx::SqliteConnection;

use crate::db_types::{Order, OrderId, OrderItem};

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Transition an order to `Complete`, but only if it is still `Pending`. The `WHERE` clause is the idempotency
/// guard: a duplicate delivery matches zero rows and gets `None` back, and SQLite serializes the writes so exactly
/// one caller can win the transition.
///
/// A `RETURNING` write must be stepped to completion before it commits, so these use `fetch_all` rather than
/// `fetch_optional`. `order_id` is unique; at most one row comes back.
pub async fn complete_order_if_pending(
    order_id: &OrderId,
    online_status: &str,
    gateway_record: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let mut rows: Vec<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET payment_status = 'Complete',
                online_payment_status = $2,
                gateway_record = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND payment_status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(online_status)
    .bind(gateway_record)
    .fetch_all(conn)
    .await?;
    Ok(rows.pop())
}

/// Transition an order to `Failed` under the same pending-only guard as [`complete_order_if_pending`].
pub async fn fail_order_if_pending(
    order_id: &OrderId,
    online_status: &str,
    gateway_record: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let mut rows: Vec<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET payment_status = 'Failed',
                online_payment_status = $2,
                gateway_record = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND payment_status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(online_status)
    .bind(gateway_record)
    .fetch_all(conn)
    .await?;
    Ok(rows.pop())
}
