use mpg_common::Rupees;
use thiserror::Error;

use crate::db_types::{Order, OrderId, OrderItem, ProductKind, TxnId, WalletTransaction};

/// The storage operations the reconciliation engine needs from its persistence collaborator.
///
/// Two families of methods matter for correctness:
///
/// * The `*_if_pending` transitions are **conditional updates**: they only fire while the record is still
///   `Pending`, and return `None` when it has already reached a terminal state. Duplicate gateway deliveries race
///   on this condition at the storage layer, so at most one of them wins and applies dependent mutations.
/// * [`credit_seller_wallet`](ReconciliationDatabase::credit_seller_wallet) is an **atomic upsert-increment**:
///   never a read-modify-write, so concurrent top-ups for the same seller cannot lose an increment.
#[allow(async_fn_in_trait)]
pub trait ReconciliationDatabase: Clone + Send + Sync {
    /// Fetch the order with the given merchant order id, if it exists.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, ReconciliationDbError>;

    /// Fetch the line items of an order.
    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, ReconciliationDbError>;

    /// Transition the order to `Complete` iff it is still `Pending`, storing the lowercased gateway status and the
    /// serialized correlation record. Returns the updated order, or `None` if the order was already terminal.
    async fn complete_order_if_pending(
        &self,
        order_id: &OrderId,
        online_status: &str,
        gateway_record: &str,
    ) -> Result<Option<Order>, ReconciliationDbError>;

    /// Transition the order to `Failed` iff it is still `Pending`. Same contract as
    /// [`complete_order_if_pending`](ReconciliationDatabase::complete_order_if_pending).
    async fn fail_order_if_pending(
        &self,
        order_id: &OrderId,
        online_status: &str,
        gateway_record: &str,
    ) -> Result<Option<Order>, ReconciliationDbError>;

    /// Fetch the wallet top-up with the given merchant transaction id, if it exists.
    async fn fetch_wallet_transaction(&self, txn_id: &TxnId) -> Result<Option<WalletTransaction>, ReconciliationDbError>;

    /// Transition the top-up to `Success` iff it is still `Pending`, storing the gateway correlation fields.
    /// Returns the updated record, or `None` if it was already terminal.
    async fn complete_wallet_topup_if_pending(
        &self,
        txn_id: &TxnId,
        tracking_id: Option<&str>,
        payment_mode: Option<&str>,
    ) -> Result<Option<WalletTransaction>, ReconciliationDbError>;

    /// Transition the top-up to `Failed` iff it is still `Pending`.
    async fn fail_wallet_topup_if_pending(
        &self,
        txn_id: &TxnId,
        tracking_id: Option<&str>,
        payment_mode: Option<&str>,
    ) -> Result<Option<WalletTransaction>, ReconciliationDbError>;

    /// Resolve which catalog shape owns a product reference, probing the kinds in
    /// [`ProductKind::FALLBACK_ORDER`] and returning the first match.
    async fn resolve_catalog_entry(&self, product_ref: &str) -> Result<Option<ProductKind>, ReconciliationDbError>;

    /// Decrement `main_stock` for the (product, variant, location) sub-record by `qty`. Returns `false` when no
    /// such sub-record exists; the caller treats that as a non-fatal per-line miss.
    async fn decrement_stock(
        &self,
        product_ref: &str,
        kind: ProductKind,
        variant_id: &str,
        location_id: &str,
        qty: i64,
    ) -> Result<bool, ReconciliationDbError>;

    /// Empty the buyer's cart.
    async fn clear_cart(&self, customer_id: &str) -> Result<(), ReconciliationDbError>;

    /// Atomically add `amount` to the seller's wallet balance, creating the wallet row with that balance if none
    /// exists. Returns the new balance.
    async fn credit_seller_wallet(&self, seller_id: &str, amount: Rupees) -> Result<Rupees, ReconciliationDbError>;
}

#[derive(Debug, Clone, Error)]
pub enum ReconciliationDbError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for ReconciliationDbError {
    fn from(e: sqlx::Error) -> Self {
        ReconciliationDbError::DatabaseError(e.to_string())
    }
}
