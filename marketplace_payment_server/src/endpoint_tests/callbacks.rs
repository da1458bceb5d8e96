use actix_web::http::StatusCode;
use marketplace_payment_engine::{
    db_types::{PaymentStatus, ProductKind, WalletTxStatus},
    gateways::{ccavenue, payu, PaymentSecrets, VerifyPolicy},
    test_utils::memory_db::MemoryDatabase,
};
use mpg_common::Rupees;

use super::helpers::{configure_app, get_path, post_form, TestSecrets, WORKING_KEY};
use crate::data_objects::{CcavCallbackForm, CcavInitiateParams};

fn enc_form(plaintext: &str) -> CcavCallbackForm {
    CcavCallbackForm { enc_resp: ccavenue::encrypt(plaintext, WORKING_KEY) }
}

fn seed_order_fixture(db: &MemoryDatabase) {
    db.seed_order("OD-1001", "cust-7", Rupees::from_rupees(999));
    db.seed_order_item("OD-1001", "prod-1", "var-1", "loc-1", 2);
    db.seed_catalog_entry("prod-1", ProductKind::Standard);
    db.seed_stock("prod-1", ProductKind::Standard, "var-1", "loc-1", 5);
    db.seed_cart("cust-7", 3);
}

fn payu_callback(txnid: &str, status: &str) -> payu::PayuCallback {
    let mut cb = payu::PayuCallback {
        txnid: txnid.to_string(),
        amount: "200.00".to_string(),
        productinfo: "Wallet top-up".to_string(),
        firstname: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        status: status.to_string(),
        payu_money_id: "403993715531".to_string(),
        mode: "CC".to_string(),
        ..Default::default()
    };
    cb.hash = payu::response_hash(&cb, &TestSecrets.payu_credentials());
    cb
}

//----------------------------------------   CCAvenue orders  --------------------------------------------------------

#[actix_web::test]
async fn successful_ccavenue_payment_end_to_end() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    seed_order_fixture(&db);
    let form = enc_form("order_id=OD-1001&order_status=Success&tracking_id=306003579829&amount=999.00&payment_mode=Net+Banking");
    let (status, location, _) =
        post_form("/api/ccav_response_handler", &form, configure_app(db.clone(), VerifyPolicy::Strict)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("http://frontend.test/order/success"));
    let order = db.order("OD-1001").unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Complete);
    assert_eq!(order.online_payment_status.as_deref(), Some("success"));
    assert!(order.gateway_record.as_deref().unwrap_or_default().contains("306003579829"));
    assert_eq!(db.stock_level("prod-1", ProductKind::Standard, "var-1", "loc-1"), Some(3));
    assert_eq!(db.cart_count("cust-7"), 0);
}

#[actix_web::test]
async fn replayed_ccavenue_callback_is_a_noop() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    seed_order_fixture(&db);
    let form = enc_form("order_id=OD-1001&order_status=Success&amount=999.00");
    post_form("/api/ccav_response_handler", &form, configure_app(db.clone(), VerifyPolicy::Strict)).await;
    let (status, location, _) =
        post_form("/api/ccav_response_handler", &form, configure_app(db.clone(), VerifyPolicy::Strict)).await;
    // The buyer still lands on the success page, but nothing was mutated twice
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("http://frontend.test/order/success"));
    assert_eq!(db.stock_level("prod-1", ProductKind::Standard, "var-1", "loc-1"), Some(3));
}

#[actix_web::test]
async fn failed_ccavenue_payment_redirects_to_failure() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    seed_order_fixture(&db);
    let form = enc_form("order_id=OD-1001&order_status=Aborted&amount=999.00");
    let (status, location, _) =
        post_form("/api/ccav_response_handler", &form, configure_app(db.clone(), VerifyPolicy::Strict)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("http://frontend.test/order/failure"));
    assert_eq!(db.order("OD-1001").unwrap().payment_status, PaymentStatus::Failed);
    assert_eq!(db.stock_level("prod-1", ProductKind::Standard, "var-1", "loc-1"), Some(5));
    assert_eq!(db.cart_count("cust-7"), 3);
}

#[actix_web::test]
async fn undecryptable_payload_goes_to_the_error_page() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let form = CcavCallbackForm { enc_resp: "not-even-hex".to_string() };
    let (status, location, _) =
        post_form("/api/ccav_response_handler", &form, configure_app(db, VerifyPolicy::Strict)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("http://frontend.test/payment/error"));
}

#[actix_web::test]
async fn unknown_order_goes_to_the_error_page() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let form = enc_form("order_id=OD-404&order_status=Success&amount=1.00");
    let (status, location, _) =
        post_form("/api/ccav_response_handler", &form, configure_app(db, VerifyPolicy::Strict)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("http://frontend.test/payment/error"));
}

//----------------------------------------  Wallet callbacks  --------------------------------------------------------

#[actix_web::test]
async fn ccavenue_wallet_topup_credits_the_seller() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    db.seed_wallet_tx("WTX-1001", "seller-9", Rupees::from_rupees(200));
    db.seed_wallet_balance("seller-9", Rupees::from_rupees(500));
    let form = enc_form("order_id=WTX-1001&order_status=Success&tracking_id=306003579829&amount=200.00");
    let (status, location, _) =
        post_form("/api/ccav_wallet_response_handler", &form, configure_app(db.clone(), VerifyPolicy::Strict)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("http://frontend.test/seller/wallet?status=success"));
    assert_eq!(db.wallet_balance("seller-9"), Some(Rupees::from_rupees(700)));
    let tx = db.wallet_tx("WTX-1001").unwrap();
    assert_eq!(tx.status, WalletTxStatus::Success);
    assert_eq!(tx.tracking_id.as_deref(), Some("306003579829"));
}

#[actix_web::test]
async fn payu_wallet_success_with_genuine_hash() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    db.seed_wallet_tx("WTX-2001", "seller-3", Rupees::from_rupees(200));
    let cb = payu_callback("WTX-2001", "success");
    let (status, location, _) =
        post_form("/api/payu_wallet_success", &cb, configure_app(db.clone(), VerifyPolicy::Strict)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("http://frontend.test/seller/wallet?status=success"));
    assert_eq!(db.wallet_balance("seller-3"), Some(Rupees::from_rupees(200)));
}

#[actix_web::test]
async fn payu_tampered_hash_fails_the_topup_under_strict_policy() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    db.seed_wallet_tx("WTX-2002", "seller-3", Rupees::from_rupees(200));
    let mut cb = payu_callback("WTX-2002", "success");
    cb.amount = "20000.00".to_string();
    let (status, location, _) =
        post_form("/api/payu_wallet_success", &cb, configure_app(db.clone(), VerifyPolicy::Strict)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("http://frontend.test/seller/wallet?status=failed"));
    assert_eq!(db.wallet_tx("WTX-2002").unwrap().status, WalletTxStatus::Failed);
    assert_eq!(db.wallet_balance("seller-3"), None);
}

#[actix_web::test]
async fn payu_bad_hash_is_accepted_under_permissive_policy() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    db.seed_wallet_tx("WTX-2003", "seller-3", Rupees::from_rupees(200));
    let mut cb = payu_callback("WTX-2003", "success");
    cb.hash = "0000".to_string();
    let (status, location, _) =
        post_form("/api/payu_wallet_success", &cb, configure_app(db.clone(), VerifyPolicy::Permissive)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("http://frontend.test/seller/wallet?status=success"));
    assert_eq!(db.wallet_balance("seller-3"), Some(Rupees::from_rupees(200)));
}

#[actix_web::test]
async fn payu_failure_route_marks_the_topup_failed() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    db.seed_wallet_tx("WTX-2004", "seller-3", Rupees::from_rupees(200));
    let cb = payu_callback("WTX-2004", "failure");
    let (status, location, _) =
        post_form("/api/payu_wallet_failure", &cb, configure_app(db.clone(), VerifyPolicy::Strict)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("http://frontend.test/seller/wallet?status=failed"));
    assert_eq!(db.wallet_tx("WTX-2004").unwrap().status, WalletTxStatus::Failed);
    assert_eq!(db.wallet_balance("seller-3"), None);
}

#[actix_web::test]
async fn wallet_credit_write_failure_is_a_500() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    db.seed_wallet_tx("WTX-3001", "seller-5", Rupees::from_rupees(200));
    db.fail_wallet_credits(true);
    let cb = payu_callback("WTX-3001", "success");
    let (status, location, body) =
        post_form("/api/payu_wallet_success", &cb, configure_app(db.clone(), VerifyPolicy::Strict)).await;
    // A missed credit must surface as a retryable server error, never a redirect
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(location.is_none());
    assert!(body.contains("error"));
}

//----------------------------------------  Outgoing request  --------------------------------------------------------

#[actix_web::test]
async fn initiate_handler_returns_an_auto_submit_form() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let params = CcavInitiateParams {
        order_id: "OD-1001".to_string(),
        amount: "999.00".to_string(),
        currency: "INR".to_string(),
        billing_name: "Asha Rao".to_string(),
        billing_email: "asha@example.com".to_string(),
        billing_tel: "9876543210".to_string(),
    };
    let (status, _, body) =
        post_form("/api/ccav_request_handler", &params, configure_app(db, VerifyPolicy::Strict)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"action="https://gw.test/transaction.do?command=initiateTransaction""#));
    assert!(body.contains(r#"name="access_code" value="AVXC123""#));
    // The encRequest value must decrypt back to the order parameters
    let enc = body
        .split(r#"name="encRequest" value=""#)
        .nth(1)
        .and_then(|s| s.split('"').next())
        .expect("encRequest not found in form");
    let plaintext = ccavenue::decrypt(enc, WORKING_KEY).expect("Could not decrypt encRequest");
    let fields = ccavenue::parse_plaintext(&plaintext);
    assert_eq!(fields["merchant_id"], "M-42");
    assert_eq!(fields["order_id"], "OD-1001");
    assert_eq!(fields["amount"], "999.00");
    assert_eq!(fields["currency"], "INR");
    assert_eq!(fields["billing_name"], "Asha Rao");
    assert_eq!(fields["redirect_url"], "https://pay.test/api/ccav_response_handler");
}

#[actix_web::test]
async fn initiate_handler_rejects_missing_order_id() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let params = CcavInitiateParams {
        order_id: String::new(),
        amount: "999.00".to_string(),
        currency: "INR".to_string(),
        billing_name: String::new(),
        billing_email: String::new(),
        billing_tel: String::new(),
    };
    let (status, _, _) = post_form("/api/ccav_request_handler", &params, configure_app(db, VerifyPolicy::Strict)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

//----------------------------------------      Health        --------------------------------------------------------

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let (status, body) = get_path("/health", configure_app(db, VerifyPolicy::Strict)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}
