//! `SqliteDatabase` is the concrete persistence backend of the reconciliation engine.
//!
//! It is a thin dispatch layer: each trait method acquires a pooled connection and calls through to the query
//! functions in [`db`](super::db). All the interesting guarantees (conditional transitions, the atomic wallet
//! upsert) live in the single SQL statements those functions run.

use std::fmt::Debug;

use mpg_common::Rupees;
use sqlx::SqlitePool;

use super::db::{carts, catalog, db_url, new_pool, orders, wallets};
use crate::{
    db_types::{Order, OrderId, OrderItem, ProductKind, TxnId, WalletTransaction},
    traits::{ReconciliationDatabase, ReconciliationDbError},
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
    /// Connect using the url from the `MPG_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl ReconciliationDatabase for SqliteDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn complete_order_if_pending(
        &self,
        order_id: &OrderId,
        online_status: &str,
        gateway_record: &str,
    ) -> Result<Option<Order>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::complete_order_if_pending(order_id, online_status, gateway_record, &mut conn).await?;
        Ok(order)
    }

    async fn fail_order_if_pending(
        &self,
        order_id: &OrderId,
        online_status: &str,
        gateway_record: &str,
    ) -> Result<Option<Order>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fail_order_if_pending(order_id, online_status, gateway_record, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_wallet_transaction(
        &self,
        txn_id: &TxnId,
    ) -> Result<Option<WalletTransaction>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let tx = wallets::fetch_wallet_transaction(txn_id, &mut conn).await?;
        Ok(tx)
    }

    async fn complete_wallet_topup_if_pending(
        &self,
        txn_id: &TxnId,
        tracking_id: Option<&str>,
        payment_mode: Option<&str>,
    ) -> Result<Option<WalletTransaction>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let tx = wallets::complete_topup_if_pending(txn_id, tracking_id, payment_mode, &mut conn).await?;
        Ok(tx)
    }

    async fn fail_wallet_topup_if_pending(
        &self,
        txn_id: &TxnId,
        tracking_id: Option<&str>,
        payment_mode: Option<&str>,
    ) -> Result<Option<WalletTransaction>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let tx = wallets::fail_topup_if_pending(txn_id, tracking_id, payment_mode, &mut conn).await?;
        Ok(tx)
    }

    async fn resolve_catalog_entry(&self, product_ref: &str) -> Result<Option<ProductKind>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let kind = catalog::resolve_catalog_entry(product_ref, &mut conn).await?;
        Ok(kind)
    }

    async fn decrement_stock(
        &self,
        product_ref: &str,
        kind: ProductKind,
        variant_id: &str,
        location_id: &str,
        qty: i64,
    ) -> Result<bool, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let adjusted = catalog::decrement_stock(product_ref, kind, variant_id, location_id, qty, &mut conn).await?;
        Ok(adjusted)
    }

    async fn clear_cart(&self, customer_id: &str) -> Result<(), ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        carts::clear_cart(customer_id, &mut conn).await?;
        Ok(())
    }

    async fn credit_seller_wallet(&self, seller_id: &str, amount: Rupees) -> Result<Rupees, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let balance = wallets::credit_seller_wallet(seller_id, amount, &mut conn).await?;
        Ok(balance)
    }
}
