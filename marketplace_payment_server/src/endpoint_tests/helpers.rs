use actix_web::{
    body::MessageBody,
    http::{header::LOCATION, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use marketplace_payment_engine::{
    events::EventProducers,
    gateways::{PaymentSecrets, PayuCredentials, VerifyPolicy},
    test_utils::memory_db::MemoryDatabase,
    ReconciliationApi,
};
use mpg_common::Secret;
use serde::Serialize;

use crate::{
    config::{CcAvenueConfig, RedirectUrls},
    data_objects::CallbackOptions,
    gateway_routes::{
        CcavRequestHandlerRoute,
        CcavResponseHandlerRoute,
        CcavWalletResponseHandlerRoute,
        PayuWalletFailureRoute,
        PayuWalletSuccessRoute,
    },
    routes::health,
};

// Test key material. DO NOT re-use these keys anywhere.
pub const WORKING_KEY: &str = "0123456789ABCDEF0123456789ABCDEF";
pub const PAYU_KEY: &str = "gtKFFx";
pub const PAYU_SALT: &str = "eCwWELxi";

#[derive(Clone, Debug, Default)]
pub struct TestSecrets;

impl PaymentSecrets for TestSecrets {
    fn ccavenue_working_key(&self) -> Secret<String> {
        Secret::new(WORKING_KEY.to_string())
    }

    fn payu_credentials(&self) -> PayuCredentials {
        PayuCredentials { key: Secret::new(PAYU_KEY.to_string()), salt: Secret::new(PAYU_SALT.to_string()) }
    }
}

pub fn test_redirects() -> RedirectUrls {
    RedirectUrls {
        order_success: "http://frontend.test/order/success".to_string(),
        order_failure: "http://frontend.test/order/failure".to_string(),
        wallet_success: "http://frontend.test/seller/wallet?status=success".to_string(),
        wallet_failure: "http://frontend.test/seller/wallet?status=failed".to_string(),
        generic_failure: "http://frontend.test/payment/error".to_string(),
    }
}

fn test_merchant() -> CcAvenueConfig {
    CcAvenueConfig {
        merchant_id: "M-42".to_string(),
        access_code: "AVXC123".to_string(),
        endpoint: "https://gw.test/transaction.do?command=initiateTransaction".to_string(),
        redirect_url: "https://pay.test/api/ccav_response_handler".to_string(),
        cancel_url: "https://pay.test/api/ccav_response_handler".to_string(),
    }
}

/// Build the same app shape as the real server, against the in-memory backend and fixed keys.
pub fn configure_app(db: MemoryDatabase, policy: VerifyPolicy) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ReconciliationApi::new(db, EventProducers::default());
        let options = CallbackOptions { redirects: test_redirects(), verify_policy: policy };
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(TestSecrets))
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(test_merchant()))
            .service(health)
            .service(
                web::scope("/api")
                    .service(CcavRequestHandlerRoute::<TestSecrets>::new())
                    .service(CcavResponseHandlerRoute::<MemoryDatabase, TestSecrets>::new())
                    .service(CcavWalletResponseHandlerRoute::<MemoryDatabase, TestSecrets>::new())
                    .service(PayuWalletSuccessRoute::<MemoryDatabase, TestSecrets>::new())
                    .service(PayuWalletFailureRoute::<MemoryDatabase, TestSecrets>::new()),
            );
    }
}

/// POST a form body and return the status, the `Location` header (if any) and the body text.
pub async fn post_form<F, B>(path: &str, form: &B, configure: F) -> (StatusCode, Option<String>, String)
where
    F: FnOnce(&mut ServiceConfig),
    B: Serialize,
{
    let req = TestRequest::post().uri(path).set_form(form).to_request();
    let service = test::init_service(App::new().configure(configure)).await;
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let location = res.headers().get(LOCATION).and_then(|v| v.to_str().ok()).map(String::from);
    let body = res.into_parts().1.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned());
    (status, location, body.unwrap_or_default())
}

pub async fn get_path<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::get().uri(path).to_request();
    let service = test::init_service(App::new().configure(configure)).await;
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let body = res.into_parts().1.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned());
    (status, body.unwrap_or_default())
}
