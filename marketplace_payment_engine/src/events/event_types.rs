use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem, WalletTransaction};

/// Fired after an order has been transitioned to `Complete` and its dependent mutations applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderPaidEvent {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }
}

/// Fired after an order has been transitioned to `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFailedEvent {
    pub order: Order,
}

impl OrderFailedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired after a wallet top-up has been credited to the seller's balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletCreditedEvent {
    pub transaction: WalletTransaction,
    pub new_balance: mpg_common::Rupees,
}

impl WalletCreditedEvent {
    pub fn new(transaction: WalletTransaction, new_balance: mpg_common::Rupees) -> Self {
        Self { transaction, new_balance }
    }
}
