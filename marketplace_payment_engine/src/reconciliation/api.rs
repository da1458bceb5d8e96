use log::*;
use mpg_common::Rupees;

use crate::{
    db_types::{Order, OrderId, OrderItem, TxnId, WalletTransaction},
    events::{EventProducers, OrderFailedEvent, OrderPaidEvent, WalletCreditedEvent},
    gateways::GatewayResponse,
    reconciliation::ReconciliationError,
    traits::ReconciliationDatabase,
};

/// What a call to [`ReconciliationApi::reconcile_order`] did.
#[derive(Debug, Clone)]
pub enum OrderOutcome {
    /// The order was pending and is now complete. Stock was decremented and the cart cleared.
    Completed { order: Order, items: Vec<OrderItem> },
    /// The order was pending and is now failed. No dependent mutations were applied.
    MarkedFailed(Order),
    /// The order was already in a terminal state. Nothing changed.
    AlreadyFinalized(Order),
}

/// What a call to [`ReconciliationApi::reconcile_wallet_topup`] did.
#[derive(Debug, Clone)]
pub enum WalletOutcome {
    /// The top-up was pending and is now successful. The seller's balance reflects the credit.
    Credited { transaction: WalletTransaction, new_balance: Rupees },
    /// The top-up was pending and is now failed. No balance was touched.
    MarkedFailed(WalletTransaction),
    /// The top-up was already in a terminal state. Nothing changed.
    AlreadyFinalized(WalletTransaction),
}

/// The reconciliation engine. Generic over the storage backend, which must uphold the conditional-transition and
/// atomic-credit contracts of [`ReconciliationDatabase`].
#[derive(Clone)]
pub struct ReconciliationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> std::fmt::Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B>
where B: ReconciliationDatabase
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    /// Reconcile an order payment against a verified gateway response.
    ///
    /// The transition is claimed with a conditional update before any dependent mutation runs. If the claim comes
    /// back empty the order was already terminal and the call returns [`OrderOutcome::AlreadyFinalized`] without
    /// touching stock, cart or notifications. A successful claim on a success response then decrements stock per
    /// line item, clears the buyer's cart and fires the order-paid hook. Per-line stock misses, stock write errors
    /// and cart failures are logged and skipped; the payment is already captured by the time they run, and a
    /// retry of the callback would find the order finalized and never reach them again.
    pub async fn reconcile_order(&self, response: &GatewayResponse) -> Result<OrderOutcome, ReconciliationError> {
        let order_id = OrderId::from(response.reference.as_str());
        let order = self
            .db
            .fetch_order(&order_id)
            .await?
            .ok_or_else(|| ReconciliationError::OrderNotFound(order_id.clone()))?;
        let online_status = response.status.to_lowercase();
        let record = response.to_record().as_json();
        if response.is_success() {
            let Some(order) = self.db.complete_order_if_pending(&order_id, &online_status, &record).await? else {
                info!("🔄️ Order {order_id} was already finalized. Ignoring duplicate gateway delivery.");
                // Re-fetch so callers see the actual terminal state, not the pre-claim snapshot
                let order = self.db.fetch_order(&order_id).await?.unwrap_or(order);
                return Ok(OrderOutcome::AlreadyFinalized(order));
            };
            info!("🔄️ Order {order_id} is paid. Applying stock and cart effects.");
            let items = self.db.fetch_order_items(&order_id).await?;
            for item in &items {
                if let Err(e) = self.apply_stock_decrement(item).await {
                    warn!("🔄️ Could not adjust stock for {} on order {order_id}. {e}", item.product_ref);
                }
            }
            if let Err(e) = self.db.clear_cart(&order.customer_id).await {
                warn!("🔄️ Could not clear cart for customer {}. {e}", order.customer_id);
            }
            self.producers.publish_order_paid(OrderPaidEvent::new(order.clone(), items.clone())).await;
            Ok(OrderOutcome::Completed { order, items })
        } else {
            let Some(order) = self.db.fail_order_if_pending(&order_id, &online_status, &record).await? else {
                info!("🔄️ Order {order_id} was already finalized. Ignoring duplicate gateway delivery.");
                let order = self.db.fetch_order(&order_id).await?.unwrap_or(order);
                return Ok(OrderOutcome::AlreadyFinalized(order));
            };
            info!("🔄️ Order {order_id} failed at the gateway with status '{}'.", response.status);
            self.producers.publish_order_failed(OrderFailedEvent::new(order.clone())).await;
            Ok(OrderOutcome::MarkedFailed(order))
        }
    }

    /// Reconcile a seller wallet top-up against a verified gateway response.
    ///
    /// Same claim-then-apply shape as [`reconcile_order`](Self::reconcile_order). On a claimed success the credit
    /// is an atomic upsert-increment on the seller's balance; if that write fails the error propagates, it is
    /// never swallowed, because a successful top-up with no matching credit is the one inconsistency this module
    /// exists to prevent.
    pub async fn reconcile_wallet_topup(&self, response: &GatewayResponse) -> Result<WalletOutcome, ReconciliationError> {
        let txn_id = TxnId::from(response.reference.as_str());
        let tx = self
            .db
            .fetch_wallet_transaction(&txn_id)
            .await?
            .ok_or_else(|| ReconciliationError::WalletTxNotFound(txn_id.clone()))?;
        let tracking_id = response.tracking_id.as_deref();
        let payment_mode = response.payment_mode.as_deref();
        if response.is_success() {
            let Some(tx) = self.db.complete_wallet_topup_if_pending(&txn_id, tracking_id, payment_mode).await? else {
                info!("🔄️ Wallet top-up {txn_id} was already finalized. Ignoring duplicate gateway delivery.");
                let tx = self.db.fetch_wallet_transaction(&txn_id).await?.unwrap_or(tx);
                return Ok(WalletOutcome::AlreadyFinalized(tx));
            };
            let new_balance = self.db.credit_seller_wallet(&tx.seller_id, tx.amount).await?;
            info!("🔄️ Credited {} to seller {}. New balance is {new_balance}.", tx.amount, tx.seller_id);
            self.producers.publish_wallet_credited(WalletCreditedEvent::new(tx.clone(), new_balance)).await;
            Ok(WalletOutcome::Credited { transaction: tx, new_balance })
        } else {
            let Some(tx) = self.db.fail_wallet_topup_if_pending(&txn_id, tracking_id, payment_mode).await? else {
                info!("🔄️ Wallet top-up {txn_id} was already finalized. Ignoring duplicate gateway delivery.");
                let tx = self.db.fetch_wallet_transaction(&txn_id).await?.unwrap_or(tx);
                return Ok(WalletOutcome::AlreadyFinalized(tx));
            };
            info!("🔄️ Wallet top-up {txn_id} failed at the gateway with status '{}'.", response.status);
            Ok(WalletOutcome::MarkedFailed(tx))
        }
    }

    /// Decrement stock for one line item, probing the catalog shapes in
    /// [`ProductKind::FALLBACK_ORDER`](crate::db_types::ProductKind::FALLBACK_ORDER). A product
    /// or stock sub-record that cannot be found is logged and skipped; errors propagate to the caller, which
    /// also treats them as per-line skips. Nothing here may block order completion.
    async fn apply_stock_decrement(&self, item: &OrderItem) -> Result<(), ReconciliationError> {
        let kind = match self.db.resolve_catalog_entry(&item.product_ref).await? {
            Some(kind) => kind,
            None => {
                warn!(
                    "🔄️ Product {} on order {} matches no catalog shape. Stock left untouched.",
                    item.product_ref, item.order_id
                );
                return Ok(());
            },
        };
        let adjusted = self
            .db
            .decrement_stock(&item.product_ref, kind, &item.variant_id, &item.location_id, item.quantity)
            .await?;
        if adjusted {
            trace!("🔄️ Decremented stock for {} ({kind:?}) by {}", item.product_ref, item.quantity);
        } else {
            warn!(
                "🔄️ No stock sub-record for product {} variant {} at location {}. Stock left untouched.",
                item.product_ref, item.variant_id, item.location_id
            );
        }
        Ok(())
    }
}
