//! # Marketplace Payment Server
//! The HTTP face of the payment reconciliation engine. It is responsible for:
//! * Receiving callback posts from the CCAvenue and PayU gateways.
//! * Decoding and verifying each callback, handing the result to the reconciliation engine, and answering with a
//!   302 redirect back into the storefront.
//! * Building the encrypted request that sends a buyer to CCAvenue in the first place.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/ccav_request_handler`: Encrypts an outgoing order payload and returns an auto-submitting form.
//! * `/api/ccav_response_handler`: The CCAvenue order payment callback.
//! * `/api/ccav_wallet_response_handler`: The CCAvenue wallet top-up callback.
//! * `/api/payu_wallet_success`, `/api/payu_wallet_failure`: The PayU wallet top-up callbacks.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod gateway_routes;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
