use mpg_common::Rupees;
use sqlx::SqliteConnection;

use crate::db_types::{SellerWallet, TxnId, WalletTransaction};

pub async fn fetch_wallet_transaction(
    txn_id: &TxnId,
    conn: &mut SqliteConnection,
) -> Result<Option<WalletTransaction>, sqlx::Error> {
    let tx = sqlx::query_as("SELECT * FROM wallet_transactions WHERE txn_id = $1")
        .bind(txn_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(tx)
}

/// Transition a top-up to `Success`, but only if it is still `Pending`. Same guard as the order transitions, and
/// the same `fetch_all` rule: the `RETURNING` write must be stepped to completion before it commits.
pub async fn complete_topup_if_pending(
    txn_id: &TxnId,
    tracking_id: Option<&str>,
    payment_mode: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<WalletTransaction>, sqlx::Error> {
    let mut rows: Vec<WalletTransaction> = sqlx::query_as(
        r#"
            UPDATE wallet_transactions
            SET status = 'Success',
                tracking_id = $2,
                payment_mode = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE txn_id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(txn_id.as_str())
    .bind(tracking_id)
    .bind(payment_mode)
    .fetch_all(conn)
    .await?;
    Ok(rows.pop())
}

pub async fn fail_topup_if_pending(
    txn_id: &TxnId,
    tracking_id: Option<&str>,
    payment_mode: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<WalletTransaction>, sqlx::Error> {
    let mut rows: Vec<WalletTransaction> = sqlx::query_as(
        r#"
            UPDATE wallet_transactions
            SET status = 'Failed',
                tracking_id = $2,
                payment_mode = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE txn_id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(txn_id.as_str())
    .bind(tracking_id)
    .bind(payment_mode)
    .fetch_all(conn)
    .await?;
    Ok(rows.pop())
}

/// Add `amount` to a seller's balance, creating the wallet row if it does not exist yet. One upsert statement, so
/// concurrent credits for the same seller serialize at the database and neither increment is lost.
pub async fn credit_seller_wallet(
    seller_id: &str,
    amount: Rupees,
    conn: &mut SqliteConnection,
) -> Result<Rupees, sqlx::Error> {
    let mut rows: Vec<(Rupees,)> = sqlx::query_as(
        r#"
            INSERT INTO seller_wallets (seller_id, balance) VALUES ($1, $2)
            ON CONFLICT (seller_id) DO UPDATE SET balance = balance + excluded.balance
            RETURNING balance;
        "#,
    )
    .bind(seller_id)
    .bind(amount)
    .fetch_all(conn)
    .await?;
    let (balance,) = rows.pop().ok_or(sqlx::Error::RowNotFound)?;
    Ok(balance)
}

pub async fn fetch_seller_wallet(
    seller_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<SellerWallet>, sqlx::Error> {
    let wallet =
        sqlx::query_as("SELECT * FROM seller_wallets WHERE seller_id = $1").bind(seller_id).fetch_optional(conn).await?;
    Ok(wallet)
}
