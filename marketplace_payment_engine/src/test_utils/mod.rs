//! Support code for the engine's own tests and for host applications testing against the engine.

pub mod memory_db;
#[cfg(feature = "sqlite")]
pub mod prepare_env;
