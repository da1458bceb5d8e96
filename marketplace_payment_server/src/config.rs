//! Server configuration
//!
//! Everything comes from environment variables, with warn-and-default behavior for the non-critical values. The
//! gateway secrets are deliberately *not* part of [`ServerConfig`]: they are read at call time through
//! [`EnvSecrets`] so that a key rotation only needs new environment values, not a restart.

use std::env;

use log::*;
use marketplace_payment_engine::gateways::{PaymentSecrets, PayuCredentials, VerifyPolicy};
use mpg_common::{helpers::parse_boolean_flag, Secret};

const DEFAULT_MPG_HOST: &str = "127.0.0.1";
const DEFAULT_MPG_PORT: u16 = 8360;
const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_CCAVENUE_ENDPOINT: &str = "https://secure.ccavenue.com/transaction/transaction.do?command=initiateTransaction";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Where the buyer's browser gets sent after each callback.
    pub redirects: RedirectUrls,
    /// What to do with a callback whose hash does not verify. Strict unless explicitly relaxed.
    pub verify_policy: VerifyPolicy,
    pub ccavenue: CcAvenueConfig,
    pub notifications: NotificationConfig,
}

/// The non-secret CCAvenue merchant parameters needed to build an outgoing payment request.
#[derive(Clone, Debug, Default)]
pub struct CcAvenueConfig {
    pub merchant_id: String,
    pub access_code: String,
    /// The `initiateTransaction` endpoint the auto-submit form posts to.
    pub endpoint: String,
    /// Where CCAvenue posts the callback after the buyer pays or cancels. These are this server's own callback
    /// routes, reachable from the public internet.
    pub redirect_url: String,
    pub cancel_url: String,
}

#[derive(Clone, Debug)]
pub struct RedirectUrls {
    pub order_success: String,
    pub order_failure: String,
    pub wallet_success: String,
    pub wallet_failure: String,
    /// Where to send the browser when the callback itself is unusable (decode, verify or lookup failure).
    pub generic_failure: String,
}

impl RedirectUrls {
    fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            order_success: format!("{base}/order/success"),
            order_failure: format!("{base}/order/failure"),
            wallet_success: format!("{base}/seller/wallet?status=success"),
            wallet_failure: format!("{base}/seller/wallet?status=failed"),
            generic_failure: format!("{base}/payment/error"),
        }
    }
}

impl Default for RedirectUrls {
    fn default() -> Self {
        Self::from_base(DEFAULT_FRONTEND_BASE_URL)
    }
}

/// Endpoint and key for one notification channel. A channel with no endpoint configured is simply not attached.
#[derive(Clone, Debug, Default)]
pub struct NotificationConfig {
    pub mail: Option<ChannelConfig>,
    pub sms: Option<ChannelConfig>,
    pub whatsapp: Option<ChannelConfig>,
}

#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub endpoint: String,
    pub api_key: Secret<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MPG_HOST.to_string(),
            port: DEFAULT_MPG_PORT,
            database_url: String::default(),
            redirects: RedirectUrls::default(),
            verify_policy: VerifyPolicy::default(),
            ccavenue: CcAvenueConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MPG_HOST").ok().unwrap_or_else(|| DEFAULT_MPG_HOST.into());
        let port = env::var("MPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MPG_PORT. {e} Using the default, {DEFAULT_MPG_PORT}, instead."
                    );
                    DEFAULT_MPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MPG_PORT);
        let database_url = env::var("MPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MPG_DATABASE_URL is not set. Please set it to the URL for the payments database.");
            String::default()
        });
        let base_url = env::var("MPG_FRONTEND_BASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MPG_FRONTEND_BASE_URL is not set. Redirects will point at {DEFAULT_FRONTEND_BASE_URL}.");
            DEFAULT_FRONTEND_BASE_URL.into()
        });
        let mut redirects = RedirectUrls::from_base(&base_url);
        if let Ok(url) = env::var("MPG_ORDER_SUCCESS_URL") {
            redirects.order_success = url;
        }
        if let Ok(url) = env::var("MPG_ORDER_FAILURE_URL") {
            redirects.order_failure = url;
        }
        if let Ok(url) = env::var("MPG_WALLET_SUCCESS_URL") {
            redirects.wallet_success = url;
        }
        if let Ok(url) = env::var("MPG_WALLET_FAILURE_URL") {
            redirects.wallet_failure = url;
        }
        if let Ok(url) = env::var("MPG_PAYMENT_ERROR_URL") {
            redirects.generic_failure = url;
        }
        let strict = parse_boolean_flag(env::var("MPG_STRICT_VERIFY").ok(), true);
        let verify_policy = if strict {
            VerifyPolicy::Strict
        } else {
            warn!("🪛️ MPG_STRICT_VERIFY is off. Unverified gateway callbacks will be accepted. Never use this in production.");
            VerifyPolicy::Permissive
        };
        let ccavenue = CcAvenueConfig::from_env_or_default();
        let notifications = NotificationConfig::from_env();
        Self { host, port, database_url, redirects, verify_policy, ccavenue, notifications }
    }
}

impl CcAvenueConfig {
    pub fn from_env_or_default() -> Self {
        let merchant_id = env::var("CCAVENUE_MERCHANT_ID").ok().unwrap_or_else(|| {
            warn!("🪛️ CCAVENUE_MERCHANT_ID is not set. Outgoing CCAvenue requests will be rejected by the gateway.");
            String::default()
        });
        let access_code = env::var("CCAVENUE_ACCESS_CODE").ok().unwrap_or_else(|| {
            warn!("🪛️ CCAVENUE_ACCESS_CODE is not set. Outgoing CCAvenue requests will be rejected by the gateway.");
            String::default()
        });
        let endpoint = env::var("CCAVENUE_ENDPOINT").ok().unwrap_or_else(|| DEFAULT_CCAVENUE_ENDPOINT.into());
        let redirect_url = env::var("CCAVENUE_REDIRECT_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CCAVENUE_REDIRECT_URL is not set. The gateway will not know where to post callbacks.");
            String::default()
        });
        let cancel_url = env::var("CCAVENUE_CANCEL_URL").ok().unwrap_or_else(|| redirect_url.clone());
        Self { merchant_id, access_code, endpoint, redirect_url, cancel_url }
    }
}

impl NotificationConfig {
    pub fn from_env() -> Self {
        let channel = |endpoint_var: &str, key_var: &str| -> Option<ChannelConfig> {
            let endpoint = env::var(endpoint_var).ok()?;
            let api_key = env::var(key_var).unwrap_or_else(|_| {
                warn!("🪛️ {endpoint_var} is set but {key_var} is not. Sending unauthenticated requests.");
                String::default()
            });
            Some(ChannelConfig { endpoint, api_key: Secret::new(api_key) })
        };
        Self {
            mail: channel("MPG_MAIL_API_URL", "MPG_MAIL_API_KEY"),
            sms: channel("MPG_SMS_API_URL", "MPG_SMS_API_KEY"),
            whatsapp: channel("MPG_WHATSAPP_API_URL", "MPG_WHATSAPP_API_KEY"),
        }
    }
}

//--------------------------------------     EnvSecrets      ---------------------------------------------------------

/// [`PaymentSecrets`] backed by environment variables, read on every call.
#[derive(Clone, Debug, Default)]
pub struct EnvSecrets;

impl PaymentSecrets for EnvSecrets {
    fn ccavenue_working_key(&self) -> Secret<String> {
        let key = env::var("CCAVENUE_WORKING_KEY").unwrap_or_else(|_| {
            error!("🪛️ CCAVENUE_WORKING_KEY is not set. CCAvenue callbacks cannot be decrypted.");
            String::default()
        });
        Secret::new(key)
    }

    fn payu_credentials(&self) -> PayuCredentials {
        let key = env::var("PAYU_WALLET_KEY").unwrap_or_else(|_| {
            error!("🪛️ PAYU_WALLET_KEY is not set. PayU callbacks cannot be verified.");
            String::default()
        });
        let salt = env::var("PAYU_WALLET_SALT").unwrap_or_else(|_| {
            error!("🪛️ PAYU_WALLET_SALT is not set. PayU callbacks cannot be verified.");
            String::default()
        });
        PayuCredentials { key: Secret::new(key), salt: Secret::new(salt) }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn redirects_derive_from_the_base_url() {
        let urls = RedirectUrls::from_base("https://shop.example.com/");
        assert_eq!(urls.order_success, "https://shop.example.com/order/success");
        assert_eq!(urls.wallet_success, "https://shop.example.com/seller/wallet?status=success");
        assert_eq!(urls.wallet_failure, "https://shop.example.com/seller/wallet?status=failed");
        assert_eq!(urls.generic_failure, "https://shop.example.com/payment/error");
    }

    #[test]
    fn wallet_redirects_can_be_overridden() {
        env::set_var("MPG_WALLET_SUCCESS_URL", "https://shop.example.com/wallet/topped-up");
        env::set_var("MPG_WALLET_FAILURE_URL", "https://shop.example.com/wallet/declined");
        let config = ServerConfig::from_env_or_default();
        assert_eq!(config.redirects.wallet_success, "https://shop.example.com/wallet/topped-up");
        assert_eq!(config.redirects.wallet_failure, "https://shop.example.com/wallet/declined");
        env::remove_var("MPG_WALLET_SUCCESS_URL");
        env::remove_var("MPG_WALLET_FAILURE_URL");
    }
}
