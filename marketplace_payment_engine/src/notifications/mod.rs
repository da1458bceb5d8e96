//! Customer and seller notifications
//!
//! Notifications are strictly best-effort. The dispatcher subscribes to the engine's event hooks, renders a
//! message per event and pushes it to every configured channel over that channel's HTTP API. A channel failure is
//! logged and dropped; it never propagates back into the reconciliation flow, because the payment record has
//! already been committed by the time a notification is attempted.

mod template;

use std::{collections::HashMap, sync::Arc};

use log::*;
use mpg_common::Secret;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

use crate::events::{EventHooks, OrderFailedEvent, OrderPaidEvent, WalletCreditedEvent};

pub use template::render_template;

pub const ORDER_PAID_TEMPLATE: &str =
    "Your payment for order $order_id was received. Amount: $amount.";
pub const ORDER_FAILED_TEMPLATE: &str =
    "Your payment for order $order_id did not go through (gateway status: $status). No amount was captured.";
pub const WALLET_CREDITED_TEMPLATE: &str =
    "Your wallet top-up $txn_id was successful. $amount has been credited. New balance: $balance.";

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Could not reach the notification service. {0}")]
    Transport(#[from] reqwest::Error),
    #[error("The notification service rejected the message with status {0}")]
    Rejected(u16),
}

/// A rendered message, addressed by platform user id. The downstream messaging services resolve the actual email
/// address or phone number from the id.
#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// A delivery mechanism for [`NotificationMessage`]s.
#[allow(async_fn_in_trait)]
pub trait NotificationChannel {
    fn name(&self) -> &'static str;
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotificationError>;
}

//--------------------------------------  Concrete channels  ---------------------------------------------------------

/// Shared shape of the three HTTP-backed channels: a JSON POST to `endpoint` with a bearer key.
#[derive(Debug, Clone)]
struct HttpChannel {
    client: Client,
    endpoint: String,
    api_key: Secret<String>,
}

impl HttpChannel {
    async fn post(&self, name: &'static str, message: &NotificationMessage) -> Result<(), NotificationError> {
        let payload = json!({
            "recipient": message.recipient,
            "subject": message.subject,
            "message": message.body,
        });
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.reveal())
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            debug!("📨️ {name} notification delivered to {}", message.recipient);
            Ok(())
        } else {
            Err(NotificationError::Rejected(status.as_u16()))
        }
    }
}

macro_rules! http_channel {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone)]
        pub struct $name(HttpChannel);

        impl $name {
            pub fn new(endpoint: String, api_key: Secret<String>) -> Self {
                Self(HttpChannel { client: Client::new(), endpoint, api_key })
            }
        }

        impl NotificationChannel for $name {
            fn name(&self) -> &'static str {
                $label
            }

            async fn send(&self, message: &NotificationMessage) -> Result<(), NotificationError> {
                self.0.post($label, message).await
            }
        }
    };
}

http_channel!(EmailChannel, "email");
http_channel!(SmsChannel, "sms");
http_channel!(WhatsAppChannel, "whatsapp");

/// The channels a dispatcher can carry. An enum rather than trait objects since the channel trait is not
/// dyn-compatible.
#[derive(Debug, Clone)]
pub enum Channel {
    Email(EmailChannel),
    Sms(SmsChannel),
    WhatsApp(WhatsAppChannel),
    #[cfg(test)]
    Test(test_support::RecordingChannel),
}

impl NotificationChannel for Channel {
    fn name(&self) -> &'static str {
        match self {
            Channel::Email(c) => c.name(),
            Channel::Sms(c) => c.name(),
            Channel::WhatsApp(c) => c.name(),
            #[cfg(test)]
            Channel::Test(c) => c.name(),
        }
    }

    async fn send(&self, message: &NotificationMessage) -> Result<(), NotificationError> {
        match self {
            Channel::Email(c) => c.send(message).await,
            Channel::Sms(c) => c.send(message).await,
            Channel::WhatsApp(c) => c.send(message).await,
            #[cfg(test)]
            Channel::Test(c) => c.send(message).await,
        }
    }
}

//--------------------------------------      Dispatcher     ---------------------------------------------------------

/// Fans a rendered message out to every configured channel, logging failures per channel.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    channels: Vec<Channel>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub async fn notify_order_paid(&self, event: &OrderPaidEvent) {
        let params = HashMap::from([
            ("order_id".to_string(), event.order.order_id.to_string()),
            ("amount".to_string(), event.order.total_price.to_string()),
        ]);
        let message = NotificationMessage {
            recipient: event.order.customer_id.clone(),
            subject: "Payment received".to_string(),
            body: render_template(ORDER_PAID_TEMPLATE, &params),
        };
        self.deliver(&message).await;
    }

    pub async fn notify_order_failed(&self, event: &OrderFailedEvent) {
        let params = HashMap::from([
            ("order_id".to_string(), event.order.order_id.to_string()),
            ("status".to_string(), event.order.online_payment_status.clone().unwrap_or_else(|| "failed".to_string())),
        ]);
        let message = NotificationMessage {
            recipient: event.order.customer_id.clone(),
            subject: "Payment failed".to_string(),
            body: render_template(ORDER_FAILED_TEMPLATE, &params),
        };
        self.deliver(&message).await;
    }

    pub async fn notify_wallet_credited(&self, event: &WalletCreditedEvent) {
        let params = HashMap::from([
            ("txn_id".to_string(), event.transaction.txn_id.to_string()),
            ("amount".to_string(), event.transaction.amount.to_string()),
            ("balance".to_string(), event.new_balance.to_string()),
        ]);
        let message = NotificationMessage {
            recipient: event.transaction.seller_id.clone(),
            subject: "Wallet credited".to_string(),
            body: render_template(WALLET_CREDITED_TEMPLATE, &params),
        };
        self.deliver(&message).await;
    }

    async fn deliver(&self, message: &NotificationMessage) {
        for channel in &self.channels {
            if let Err(e) = channel.send(message).await {
                warn!("📨️ Could not deliver {} notification to {}. {e}", channel.name(), message.recipient);
            }
        }
    }

    /// Wire this dispatcher into the engine's event hooks. Each hook clones the dispatcher handle and runs the
    /// delivery on the hook's own task.
    pub fn into_hooks(self) -> EventHooks {
        let dispatcher = Arc::new(self);
        let on_paid = Arc::clone(&dispatcher);
        let on_failed = Arc::clone(&dispatcher);
        let on_credited = dispatcher;
        EventHooks::default()
            .on_order_paid(move |ev: OrderPaidEvent| {
                let d = Arc::clone(&on_paid);
                Box::pin(async move { d.notify_order_paid(&ev).await })
            })
            .on_order_failed(move |ev: OrderFailedEvent| {
                let d = Arc::clone(&on_failed);
                Box::pin(async move { d.notify_order_failed(&ev).await })
            })
            .on_wallet_credited(move |ev: WalletCreditedEvent| {
                let d = Arc::clone(&on_credited);
                Box::pin(async move { d.notify_wallet_credited(&ev).await })
            })
    }
}
