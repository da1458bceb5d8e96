use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{
    channel::{EventHandler, EventProducer, Handler},
    event_types::{OrderFailedEvent, OrderPaidEvent, WalletCreditedEvent},
};

/// The set of callbacks a host application wants run when reconciliation commits a transition. Any subset may be
/// registered; unregistered hooks cost nothing.
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_order_failed: Option<Handler<OrderFailedEvent>>,
    pub on_wallet_credited: Option<Handler<WalletCreditedEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(mut self, f: F) -> Self
    where F: Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_order_failed<F>(mut self, f: F) -> Self
    where F: Fn(OrderFailedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        self.on_order_failed = Some(Arc::new(f));
        self
    }

    pub fn on_wallet_credited<F>(mut self, f: F) -> Self
    where F: Fn(WalletCreditedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        self.on_wallet_credited = Some(Arc::new(f));
        self
    }
}

/// The receiving side of the hook channels. Created once at startup, handed its producers, then consumed by
/// [`start`](EventHandlers::start).
pub struct EventHandlers {
    order_paid: Option<EventHandler<OrderPaidEvent>>,
    order_failed: Option<EventHandler<OrderFailedEvent>>,
    wallet_credited: Option<EventHandler<WalletCreditedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let order_paid = hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f));
        let order_failed = hooks.on_order_failed.map(|f| EventHandler::new(buffer_size, f));
        let wallet_credited = hooks.on_wallet_credited.map(|f| EventHandler::new(buffer_size, f));
        Self { order_paid, order_failed, wallet_credited }
    }

    pub fn producers(&self) -> EventProducers {
        EventProducers {
            order_paid: self.order_paid.as_ref().map(|h| h.subscribe()),
            order_failed: self.order_failed.as_ref().map(|h| h.subscribe()),
            wallet_credited: self.wallet_credited.as_ref().map(|h| h.subscribe()),
        }
    }

    /// Spawn one task per registered hook. Each task runs until its last producer is dropped.
    pub fn start(self) {
        if let Some(h) = self.order_paid {
            tokio::spawn(h.start_handler());
        }
        if let Some(h) = self.order_failed {
            tokio::spawn(h.start_handler());
        }
        if let Some(h) = self.wallet_credited {
            tokio::spawn(h.start_handler());
        }
        debug!("📬️ Event handlers started");
    }
}

/// Cheap clone-able handles the reconciliation engine uses to publish events. A `None` producer means nobody
/// subscribed to that hook and publishing is a no-op.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid: Option<EventProducer<OrderPaidEvent>>,
    pub order_failed: Option<EventProducer<OrderFailedEvent>>,
    pub wallet_credited: Option<EventProducer<WalletCreditedEvent>>,
}

impl EventProducers {
    pub async fn publish_order_paid(&self, event: OrderPaidEvent) {
        if let Some(p) = &self.order_paid {
            trace!("📬️ Publishing OrderPaid event for order {}", event.order.order_id);
            p.publish_event(event).await;
        }
    }

    pub async fn publish_order_failed(&self, event: OrderFailedEvent) {
        if let Some(p) = &self.order_failed {
            trace!("📬️ Publishing OrderFailed event for order {}", event.order.order_id);
            p.publish_event(event).await;
        }
    }

    pub async fn publish_wallet_credited(&self, event: WalletCreditedEvent) {
        if let Some(p) = &self.wallet_credited {
            trace!("📬️ Publishing WalletCredited event for {}", event.transaction.txn_id);
            p.publish_event(event).await;
        }
    }
}
