//! Marketplace Payment Engine
//!
//! The engine turns payment gateway callbacks into durable marketplace state. It is server-agnostic: the HTTP
//! layer lives in `marketplace_payment_server`, and this library owns everything between the decoded request body
//! and the database.
//!
//! The pipeline has three stages:
//! 1. Gateway codecs ([`mod@gateways`]). Decode and authenticate the wire formats of the supported gateways
//!    (CCAvenue's AES-encrypted blob, PayU's salted reverse hash) and normalize them into a single
//!    [`GatewayResponse`](gateways::GatewayResponse) shape. Pure functions; no IO.
//! 2. Reconciliation ([`mod@reconciliation`]). Apply a verified response to an order or a seller wallet top-up:
//!    claim the pending record with a conditional transition, then run the dependent mutations (stock, cart,
//!    wallet credit). Duplicate deliveries lose the claim and change nothing. Backends implement the
//!    [`ReconciliationDatabase`](traits::ReconciliationDatabase) trait; SQLite is the one shipped here.
//! 3. Events and notifications ([`mod@events`], [`mod@notifications`]). Each committed transition publishes an
//!    event on a tokio mpsc channel; the notification dispatcher consumes them and fans messages out to the
//!    configured channels, strictly best-effort.

pub mod db_types;
pub mod events;
pub mod gateways;
pub mod notifications;
mod reconciliation;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod test_utils;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use reconciliation::{OrderOutcome, ReconciliationApi, ReconciliationError, WalletOutcome};
