//! Low-level SQLite interactions.
//!
//! Simple functions over stateful structs: everything takes a `&mut SqliteConnection`, so callers can run a query
//! on a pooled connection or inside a transaction without any other changes. The conditional-transition and
//! upsert-increment statements that the engine's guarantees rest on live here, as single statements.

use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod carts;
pub mod catalog;
pub mod orders;
pub mod wallets;

const SQLITE_DB_URL: &str = "sqlite://data/marketplace_payments.db";

pub fn db_url() -> String {
    let result = env::var("MPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("MPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
