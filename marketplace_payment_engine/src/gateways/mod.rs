//! Gateway response decoding and verification
//!
//! A gateway callback arrives as an untrusted wire payload. This module turns it into a [`GatewayResponse`] in two
//! stages:
//! 1. **Decode**, gateway-specific: CCAvenue payloads are decrypted and split into a field map
//!    ([`ccavenue::decode_callback`]); PayU payloads arrive as plain form fields ([`payu::PayuCallback`]).
//! 2. **Verify**: authenticate that the decoded response really came from the gateway. CCAvenue's authentication
//!    factor is possession of the shared working key (decryption succeeding); PayU uses a salted SHA-512 reverse
//!    hash. Verification is pure: no side effects, secrets come in through [`PaymentSecrets`].
//!
//! Nothing in here touches the database. The verified response is handed to the reconciliation engine as-is.

pub mod ccavenue;
pub mod payu;

use std::collections::BTreeMap;

use chrono::Utc;
use mpg_common::{Rupees, Secret};
use thiserror::Error;

use crate::db_types::{Gateway, GatewayRecord};

/// The gateway's literal token for a captured payment. Compared case-insensitively.
pub const SUCCESS_TOKEN: &str = "Success";

//--------------------------------------   GatewayResponse   ---------------------------------------------------------
/// A decoded, verified gateway callback, normalized across gateways.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub gateway: Gateway,
    /// The merchant-supplied reference: the order id for order payments, the txn id for wallet top-ups.
    pub reference: String,
    /// The gateway's status token, verbatim.
    pub status: String,
    pub tracking_id: Option<String>,
    pub amount: Option<Rupees>,
    pub payment_mode: Option<String>,
    /// Every decoded field, for diagnostics. Never persisted wholesale.
    pub fields: BTreeMap<String, String>,
}

impl GatewayResponse {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case(SUCCESS_TOKEN)
    }

    /// The audit blob that gets written into the transaction's correlation field.
    pub fn to_record(&self) -> GatewayRecord {
        GatewayRecord {
            gateway: self.gateway,
            status_message: self.status.to_lowercase(),
            tracking_id: self.tracking_id.clone(),
            amount: self.amount,
            payment_mode: self.payment_mode.clone(),
            received_at: Utc::now(),
        }
    }
}

//--------------------------------------      Errors        ----------------------------------------------------------
/// The payload could not be turned into a field map at all. Always fatal for the callback.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    #[error("The callback payload is missing the `{0}` field")]
    MissingField(&'static str),
    #[error("The ciphertext is not valid hex. {0}")]
    InvalidHex(String),
    #[error("The payload could not be decrypted. {0}")]
    DecryptionFailed(String),
    #[error("The decrypted payload is not valid UTF-8")]
    NotUtf8,
}

/// The payload decoded, but we could not establish that it came from the gateway.
#[derive(Debug, Clone, Error)]
pub enum VerificationError {
    #[error("Required field `{0}` is absent from the decoded response")]
    MissingField(&'static str),
    #[error("The response hash does not match the value computed from the salt and fields")]
    HashMismatch,
}

//--------------------------------------    VerifyPolicy    ----------------------------------------------------------
/// What to do when hash verification fails.
///
/// `Strict` treats the callback as a failure outcome. `Permissive` logs and falls through to the status-based
/// outcome; it exists for gateway sandbox environments that return inconsistent hashes and must never be the
/// production setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyPolicy {
    #[default]
    Strict,
    Permissive,
}

//--------------------------------------   PaymentSecrets   ----------------------------------------------------------
/// Key material for PayU's hash scheme.
#[derive(Clone, Debug, Default)]
pub struct PayuCredentials {
    pub key: Secret<String>,
    pub salt: Secret<String>,
}

/// Source of gateway secrets, looked up at call time so keys can be rotated without a restart.
///
/// The server provides an environment-backed implementation; tests inject fixed keys.
pub trait PaymentSecrets: Send + Sync {
    /// The CCAvenue working key for this merchant.
    fn ccavenue_working_key(&self) -> Secret<String>;

    /// The PayU merchant key and salt.
    fn payu_credentials(&self) -> PayuCredentials;
}

/// Compare two hash strings without early exit, so the comparison time does not leak how many leading bytes match.
pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().iter().zip(b.as_bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
