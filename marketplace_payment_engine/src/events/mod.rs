//! Fire-and-forget event plumbing
//!
//! The reconciliation engine publishes an event after each committed transition (order paid, order failed, wallet
//! credited). Consumers, primarily the notification dispatcher, subscribe through [`EventHooks`]. Delivery is a
//! tokio mpsc channel with one spawned task per event, so a slow or failing consumer can never delay or roll back
//! the transition that produced the event.

mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderFailedEvent, OrderPaidEvent, WalletCreditedEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
