use marketplace_payment_engine::gateways::VerifyPolicy;
use serde::{Deserialize, Serialize};

use crate::config::RedirectUrls;

/// The form body CCAvenue posts to every callback route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CcavCallbackForm {
    #[serde(rename = "encResp", default)]
    pub enc_resp: String,
}

/// The storefront's request to start a CCAvenue payment. The server wraps these in the merchant parameters,
/// encrypts the lot and returns an auto-submitting form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CcavInitiateParams {
    pub order_id: String,
    pub amount: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub billing_name: String,
    #[serde(default)]
    pub billing_email: String,
    #[serde(default)]
    pub billing_tel: String,
}

fn default_currency() -> String {
    mpg_common::INR_CURRENCY_CODE.to_string()
}

/// Per-callback behavior shared by all the gateway routes, injected as app data.
#[derive(Debug, Clone)]
pub struct CallbackOptions {
    pub redirects: RedirectUrls,
    pub verify_policy: VerifyPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self { success: false, message: message.into() }
    }
}
