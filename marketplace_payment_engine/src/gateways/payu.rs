//! PayU wire format
//!
//! PayU posts its callback as a plain form-urlencoded body, so there is nothing to decrypt. Authenticity comes from
//! a salted reverse hash: the gateway computes
//!
//! ```text
//!     SHA-512( SALT|status|||||udf5|udf4|udf3|udf2|udf1|email|firstname|productinfo|amount|txnid|KEY )
//! ```
//!
//! over the response fields (empty strings for the unused slots) and sends it in the `hash` field. We recompute the
//! digest from our own copy of the salt and key and compare byte-for-byte. A response whose `amount` was tampered
//! with produces a different digest and is rejected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::{
    db_types::Gateway,
    gateways::{constant_time_eq, DecodeError, GatewayResponse, PayuCredentials, VerificationError},
};

//--------------------------------------    PayuCallback    ----------------------------------------------------------
/// The fields PayU sends to the success/failure webhooks. Deserialized straight from the form body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayuCallback {
    #[serde(default)]
    pub txnid: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub productinfo: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub udf1: String,
    #[serde(default)]
    pub udf2: String,
    #[serde(default)]
    pub udf3: String,
    #[serde(default)]
    pub udf4: String,
    #[serde(default)]
    pub udf5: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default, rename = "payuMoneyId")]
    pub payu_money_id: String,
    #[serde(default)]
    pub bank_ref_num: String,
    #[serde(default)]
    pub mode: String,
}

impl PayuCallback {
    /// The fields a callback must carry before it is worth hashing at all.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.txnid.is_empty() {
            return Err(DecodeError::MissingField("txnid"));
        }
        if self.status.is_empty() {
            return Err(DecodeError::MissingField("status"));
        }
        if self.amount.is_empty() {
            return Err(DecodeError::MissingField("amount"));
        }
        Ok(())
    }

    /// The gateway-side transaction reference, preferring the PayU id over the bank reference.
    pub fn tracking_id(&self) -> Option<String> {
        if !self.payu_money_id.is_empty() {
            Some(self.payu_money_id.clone())
        } else if !self.bank_ref_num.is_empty() {
            Some(self.bank_ref_num.clone())
        } else {
            None
        }
    }
}

/// Recompute the reverse hash for a callback from the merchant's salt and key.
pub fn response_hash(callback: &PayuCallback, credentials: &PayuCredentials) -> String {
    let hash_string = format!(
        "{}|{}|||||{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
        credentials.salt.reveal(),
        callback.status,
        callback.udf5,
        callback.udf4,
        callback.udf3,
        callback.udf2,
        callback.udf1,
        callback.email,
        callback.firstname,
        callback.productinfo,
        callback.amount,
        callback.txnid,
        credentials.key.reveal(),
    );
    let digest = Sha512::digest(hash_string.as_bytes());
    format!("{digest:x}")
}

/// Verify the callback's reverse hash. Pure: no side effects, no lookups.
pub fn verify(callback: &PayuCallback, credentials: &PayuCredentials) -> Result<(), VerificationError> {
    if callback.hash.is_empty() {
        return Err(VerificationError::MissingField("hash"));
    }
    // Byte-equal comparison: PayU emits lowercase hex and we match it exactly.
    let expected = response_hash(callback, credentials);
    if constant_time_eq(&expected, &callback.hash) {
        Ok(())
    } else {
        Err(VerificationError::HashMismatch)
    }
}

/// Normalize a validated callback. Call after [`verify`] (or after the policy decision when verification failed).
pub fn into_response(callback: &PayuCallback) -> GatewayResponse {
    let mut fields = BTreeMap::new();
    fields.insert("txnid".to_string(), callback.txnid.clone());
    fields.insert("amount".to_string(), callback.amount.clone());
    fields.insert("productinfo".to_string(), callback.productinfo.clone());
    fields.insert("firstname".to_string(), callback.firstname.clone());
    fields.insert("email".to_string(), callback.email.clone());
    fields.insert("status".to_string(), callback.status.clone());
    fields.insert("mode".to_string(), callback.mode.clone());
    GatewayResponse {
        gateway: Gateway::PayU,
        reference: callback.txnid.clone(),
        status: callback.status.clone(),
        tracking_id: callback.tracking_id(),
        amount: callback.amount.parse().ok(),
        payment_mode: if callback.mode.is_empty() { None } else { Some(callback.mode.clone()) },
        fields,
    }
}

#[cfg(test)]
mod test {
    use mpg_common::{Rupees, Secret};

    use super::*;

    fn credentials() -> PayuCredentials {
        PayuCredentials { key: Secret::new("gtKFFx".to_string()), salt: Secret::new("eCwWELxi".to_string()) }
    }

    fn sample_callback() -> PayuCallback {
        let mut cb = PayuCallback {
            txnid: "WTX-1001".to_string(),
            amount: "200.00".to_string(),
            productinfo: "Wallet top-up".to_string(),
            firstname: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            status: "success".to_string(),
            payu_money_id: "403993715531".to_string(),
            mode: "CC".to_string(),
            ..Default::default()
        };
        cb.hash = response_hash(&cb, &credentials());
        cb
    }

    #[test]
    fn genuine_hash_verifies() {
        let cb = sample_callback();
        assert!(verify(&cb, &credentials()).is_ok());
    }

    #[test]
    fn uppercase_hash_is_rejected() {
        let mut cb = sample_callback();
        cb.hash = cb.hash.to_uppercase();
        assert!(matches!(verify(&cb, &credentials()), Err(VerificationError::HashMismatch)));
    }

    #[test]
    fn tampered_amount_is_rejected() {
        let mut cb = sample_callback();
        cb.amount = "20000.00".to_string();
        assert!(matches!(verify(&cb, &credentials()), Err(VerificationError::HashMismatch)));
    }

    #[test]
    fn tampered_status_is_rejected() {
        let mut cb = sample_callback();
        cb.status = "success".to_string();
        cb.hash = response_hash(&cb, &credentials());
        cb.status = "failure".to_string();
        assert!(matches!(verify(&cb, &credentials()), Err(VerificationError::HashMismatch)));
    }

    #[test]
    fn wrong_salt_is_rejected() {
        let cb = sample_callback();
        let other = PayuCredentials { key: Secret::new("gtKFFx".to_string()), salt: Secret::new("nottherealsalt".to_string()) };
        assert!(matches!(verify(&cb, &other), Err(VerificationError::HashMismatch)));
    }

    #[test]
    fn missing_hash_is_flagged() {
        let mut cb = sample_callback();
        cb.hash = String::new();
        assert!(matches!(verify(&cb, &credentials()), Err(VerificationError::MissingField("hash"))));
    }

    #[test]
    fn validation_requires_core_fields() {
        let mut cb = sample_callback();
        cb.txnid = String::new();
        assert!(matches!(cb.validate(), Err(DecodeError::MissingField("txnid"))));
        let mut cb = sample_callback();
        cb.status = String::new();
        assert!(matches!(cb.validate(), Err(DecodeError::MissingField("status"))));
    }

    #[test]
    fn normalization() {
        let cb = sample_callback();
        let response = into_response(&cb);
        assert_eq!(response.reference, "WTX-1001");
        assert!(response.is_success());
        assert_eq!(response.amount, Some(Rupees::from_rupees(200)));
        assert_eq!(response.tracking_id.as_deref(), Some("403993715531"));
        assert_eq!(response.payment_mode.as_deref(), Some("CC"));
    }

    #[test]
    fn bank_ref_fallback_for_tracking_id() {
        let mut cb = sample_callback();
        cb.payu_money_id = String::new();
        cb.bank_ref_num = "BRN-77".to_string();
        assert_eq!(cb.tracking_id().as_deref(), Some("BRN-77"));
    }
}
