//! The persistence seam of the engine.
//!
//! The reconciliation engine never talks to a datastore directly; it goes through [`ReconciliationDatabase`].
//! Concrete backends (SQLite in this repo, an in-memory double for tests) implement the trait. Every mutation the
//! trait exposes is single-statement atomic at the storage layer, which is what the engine's idempotency and
//! concurrency guarantees lean on.

mod reconciliation_database;

pub use reconciliation_database::{ReconciliationDatabase, ReconciliationDbError};
