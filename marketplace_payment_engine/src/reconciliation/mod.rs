//! The reconciliation engine
//!
//! [`ReconciliationApi`] is the single entry point for turning a verified [`GatewayResponse`] into durable state
//! changes. It owns the ordering of mutations (finalize first, then the dependent stock, cart and wallet effects)
//! and the idempotency rule: a transition only fires while the record is still pending, so a duplicate gateway
//! delivery finds the record already terminal and changes nothing.
//!
//! [`GatewayResponse`]: crate::gateways::GatewayResponse

mod api;
mod errors;

pub use api::{OrderOutcome, ReconciliationApi, WalletOutcome};
pub use errors::ReconciliationError;
