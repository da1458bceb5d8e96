//! A hashmap-backed [`ReconciliationDatabase`] for tests.
//!
//! Honors the same contracts as the SQLite backend (pending-only transitions, upsert-increment credits) with the
//! lock standing in for statement atomicity. Seeding and inspection helpers let tests set up and assert state
//! without SQL.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::Utc;
use mpg_common::Rupees;

use crate::{
    db_types::{Order, OrderId, OrderItem, PaymentStatus, ProductKind, TxnId, WalletTransaction, WalletTxStatus},
    traits::{ReconciliationDatabase, ReconciliationDbError},
};

type StockKey = (String, ProductKind, String, String);

#[derive(Default)]
struct Inner {
    orders: HashMap<OrderId, Order>,
    order_items: HashMap<OrderId, Vec<OrderItem>>,
    wallet_txs: HashMap<TxnId, WalletTransaction>,
    wallet_balances: HashMap<String, Rupees>,
    cart_items: HashMap<String, i64>,
    catalog: HashMap<String, Vec<ProductKind>>,
    stock: HashMap<StockKey, i64>,
    next_id: i64,
    fail_wallet_credits: bool,
    fail_stock_decrements: bool,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    //----------------------------------  Seeding helpers  -----------------------------------------------------------

    pub fn seed_order(&self, order_id: &str, customer_id: &str, total_price: Rupees) -> Order {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let order = Order {
            id: inner.next_id(),
            order_id: OrderId::from(order_id),
            customer_id: customer_id.to_string(),
            total_price,
            payment_status: PaymentStatus::Pending,
            online_payment_status: None,
            gateway_record: None,
            created_at: now,
            updated_at: now,
        };
        inner.orders.insert(order.order_id.clone(), order.clone());
        order
    }

    pub fn seed_order_item(&self, order_id: &str, product_ref: &str, variant_id: &str, location_id: &str, qty: i64) {
        let mut inner = self.inner.lock().unwrap();
        let item = OrderItem {
            id: inner.next_id(),
            order_id: OrderId::from(order_id),
            product_ref: product_ref.to_string(),
            variant_id: variant_id.to_string(),
            location_id: location_id.to_string(),
            quantity: qty,
            unit_price: Rupees::from_rupees(100),
        };
        inner.order_items.entry(OrderId::from(order_id)).or_default().push(item);
    }

    pub fn seed_wallet_tx(&self, txn_id: &str, seller_id: &str, amount: Rupees) -> WalletTransaction {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let tx = WalletTransaction {
            id: inner.next_id(),
            txn_id: TxnId::from(txn_id),
            seller_id: seller_id.to_string(),
            amount,
            status: WalletTxStatus::Pending,
            tracking_id: None,
            payment_mode: None,
            created_at: now,
            updated_at: now,
        };
        inner.wallet_txs.insert(tx.txn_id.clone(), tx.clone());
        tx
    }

    pub fn seed_wallet_balance(&self, seller_id: &str, balance: Rupees) {
        self.inner.lock().unwrap().wallet_balances.insert(seller_id.to_string(), balance);
    }

    pub fn seed_cart(&self, customer_id: &str, item_count: i64) {
        self.inner.lock().unwrap().cart_items.insert(customer_id.to_string(), item_count);
    }

    pub fn seed_catalog_entry(&self, product_ref: &str, kind: ProductKind) {
        self.inner.lock().unwrap().catalog.entry(product_ref.to_string()).or_default().push(kind);
    }

    pub fn seed_stock(&self, product_ref: &str, kind: ProductKind, variant_id: &str, location_id: &str, stock: i64) {
        self.inner
            .lock()
            .unwrap()
            .stock
            .insert((product_ref.to_string(), kind, variant_id.to_string(), location_id.to_string()), stock);
    }

    /// Make every subsequent wallet credit fail, for exercising error propagation.
    pub fn fail_wallet_credits(&self, fail: bool) {
        self.inner.lock().unwrap().fail_wallet_credits = fail;
    }

    /// Make every subsequent stock decrement fail, for exercising the per-line skip behavior.
    pub fn fail_stock_decrements(&self, fail: bool) {
        self.inner.lock().unwrap().fail_stock_decrements = fail;
    }

    //----------------------------------  Inspection helpers  --------------------------------------------------------

    pub fn order(&self, order_id: &str) -> Option<Order> {
        self.inner.lock().unwrap().orders.get(&OrderId::from(order_id)).cloned()
    }

    pub fn wallet_tx(&self, txn_id: &str) -> Option<WalletTransaction> {
        self.inner.lock().unwrap().wallet_txs.get(&TxnId::from(txn_id)).cloned()
    }

    pub fn wallet_balance(&self, seller_id: &str) -> Option<Rupees> {
        self.inner.lock().unwrap().wallet_balances.get(seller_id).copied()
    }

    pub fn cart_count(&self, customer_id: &str) -> i64 {
        self.inner.lock().unwrap().cart_items.get(customer_id).copied().unwrap_or_default()
    }

    pub fn stock_level(&self, product_ref: &str, kind: ProductKind, variant_id: &str, location_id: &str) -> Option<i64> {
        self.inner
            .lock()
            .unwrap()
            .stock
            .get(&(product_ref.to_string(), kind, variant_id.to_string(), location_id.to_string()))
            .copied()
    }
}

impl ReconciliationDatabase for MemoryDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, ReconciliationDbError> {
        Ok(self.inner.lock().unwrap().orders.get(order_id).cloned())
    }

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, ReconciliationDbError> {
        Ok(self.inner.lock().unwrap().order_items.get(order_id).cloned().unwrap_or_default())
    }

    async fn complete_order_if_pending(
        &self,
        order_id: &OrderId,
        online_status: &str,
        gateway_record: &str,
    ) -> Result<Option<Order>, ReconciliationDbError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(order) = inner.orders.get_mut(order_id) else { return Ok(None) };
        if order.payment_status.is_terminal() {
            return Ok(None);
        }
        order.payment_status = PaymentStatus::Complete;
        order.online_payment_status = Some(online_status.to_string());
        order.gateway_record = Some(gateway_record.to_string());
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn fail_order_if_pending(
        &self,
        order_id: &OrderId,
        online_status: &str,
        gateway_record: &str,
    ) -> Result<Option<Order>, ReconciliationDbError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(order) = inner.orders.get_mut(order_id) else { return Ok(None) };
        if order.payment_status.is_terminal() {
            return Ok(None);
        }
        order.payment_status = PaymentStatus::Failed;
        order.online_payment_status = Some(online_status.to_string());
        order.gateway_record = Some(gateway_record.to_string());
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn fetch_wallet_transaction(
        &self,
        txn_id: &TxnId,
    ) -> Result<Option<WalletTransaction>, ReconciliationDbError> {
        Ok(self.inner.lock().unwrap().wallet_txs.get(txn_id).cloned())
    }

    async fn complete_wallet_topup_if_pending(
        &self,
        txn_id: &TxnId,
        tracking_id: Option<&str>,
        payment_mode: Option<&str>,
    ) -> Result<Option<WalletTransaction>, ReconciliationDbError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(tx) = inner.wallet_txs.get_mut(txn_id) else { return Ok(None) };
        if tx.status.is_terminal() {
            return Ok(None);
        }
        tx.status = WalletTxStatus::Success;
        tx.tracking_id = tracking_id.map(String::from);
        tx.payment_mode = payment_mode.map(String::from);
        tx.updated_at = Utc::now();
        Ok(Some(tx.clone()))
    }

    async fn fail_wallet_topup_if_pending(
        &self,
        txn_id: &TxnId,
        tracking_id: Option<&str>,
        payment_mode: Option<&str>,
    ) -> Result<Option<WalletTransaction>, ReconciliationDbError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(tx) = inner.wallet_txs.get_mut(txn_id) else { return Ok(None) };
        if tx.status.is_terminal() {
            return Ok(None);
        }
        tx.status = WalletTxStatus::Failed;
        tx.tracking_id = tracking_id.map(String::from);
        tx.payment_mode = payment_mode.map(String::from);
        tx.updated_at = Utc::now();
        Ok(Some(tx.clone()))
    }

    async fn resolve_catalog_entry(&self, product_ref: &str) -> Result<Option<ProductKind>, ReconciliationDbError> {
        let inner = self.inner.lock().unwrap();
        let Some(kinds) = inner.catalog.get(product_ref) else { return Ok(None) };
        Ok(ProductKind::FALLBACK_ORDER.into_iter().find(|k| kinds.contains(k)))
    }

    async fn decrement_stock(
        &self,
        product_ref: &str,
        kind: ProductKind,
        variant_id: &str,
        location_id: &str,
        qty: i64,
    ) -> Result<bool, ReconciliationDbError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_stock_decrements {
            return Err(ReconciliationDbError::DatabaseError("stock write rejected by test double".to_string()));
        }
        let key = (product_ref.to_string(), kind, variant_id.to_string(), location_id.to_string());
        match inner.stock.get_mut(&key) {
            Some(stock) => {
                *stock -= qty;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn clear_cart(&self, customer_id: &str) -> Result<(), ReconciliationDbError> {
        self.inner.lock().unwrap().cart_items.remove(customer_id);
        Ok(())
    }

    async fn credit_seller_wallet(&self, seller_id: &str, amount: Rupees) -> Result<Rupees, ReconciliationDbError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_wallet_credits {
            return Err(ReconciliationDbError::DatabaseError("wallet credit rejected by test double".to_string()));
        }
        let balance = inner.wallet_balances.entry(seller_id.to_string()).or_insert(Rupees::from_paise(0));
        *balance = *balance + amount;
        Ok(*balance)
    }
}
