//! Gateway callback handlers
//!
//! Every callback route follows the same shape: decode and verify the payload, hand the normalized response to the
//! reconciliation engine, then answer with exactly one 302 redirect back into the storefront. The browser carrying
//! the callback belongs to the buyer, so errors redirect to a friendly failure page rather than returning raw
//! status codes; the one exception is a database failure, which is a real 500 because the payment's final state is
//! unknown and the gateway should retry.

use actix_web::{http::header::LOCATION, web, HttpResponse, ResponseError};
use log::*;
use marketplace_payment_engine::{
    db_types::{PaymentStatus, WalletTransaction, WalletTxStatus},
    gateways::{ccavenue, payu, GatewayResponse, PaymentSecrets, VerifyPolicy},
    traits::ReconciliationDatabase,
    OrderOutcome,
    ReconciliationApi,
    ReconciliationError,
    WalletOutcome,
};

use crate::{
    config::CcAvenueConfig,
    data_objects::{CallbackOptions, CcavCallbackForm, CcavInitiateParams, JsonResponse},
    errors::ServerError,
    route,
};

fn redirect(url: &str) -> HttpResponse {
    HttpResponse::Found().insert_header((LOCATION, url)).finish()
}

fn decode_ccavenue<S: PaymentSecrets>(form: &CcavCallbackForm, secrets: &S) -> Result<GatewayResponse, String> {
    let key = secrets.ccavenue_working_key();
    let fields = ccavenue::decode_callback(&form.enc_resp, key.reveal()).map_err(|e| e.to_string())?;
    ccavenue::into_verified_response(fields).map_err(|e| e.to_string())
}

//----------------------------------------   CCAvenue orders  --------------------------------------------------------
route!(ccav_response_handler => Post "/ccav_response_handler" impl ReconciliationDatabase, PaymentSecrets);
/// The CCAvenue callback for order payments.
pub async fn ccav_response_handler<B, S>(
    form: web::Form<CcavCallbackForm>,
    api: web::Data<ReconciliationApi<B>>,
    secrets: web::Data<S>,
    options: web::Data<CallbackOptions>,
) -> HttpResponse
where
    B: ReconciliationDatabase + 'static,
    S: PaymentSecrets + 'static,
{
    let response = match decode_ccavenue(&form.into_inner(), secrets.get_ref()) {
        Ok(r) => r,
        Err(e) => {
            warn!("💳️ Could not decode CCAvenue order callback. {e}");
            return redirect(&options.redirects.generic_failure);
        },
    };
    match api.reconcile_order(&response).await {
        Ok(OrderOutcome::Completed { order, .. }) => {
            info!("💳️ Order {} paid via CCAvenue. Redirecting buyer to the success page.", order.order_id);
            redirect(&options.redirects.order_success)
        },
        Ok(OrderOutcome::MarkedFailed(order)) => {
            info!("💳️ Order {} payment failed at CCAvenue.", order.order_id);
            redirect(&options.redirects.order_failure)
        },
        Ok(OrderOutcome::AlreadyFinalized(order)) => {
            if order.payment_status == PaymentStatus::Complete {
                redirect(&options.redirects.order_success)
            } else {
                redirect(&options.redirects.order_failure)
            }
        },
        Err(ReconciliationError::OrderNotFound(id)) => {
            warn!("💳️ CCAvenue callback referenced unknown order {id}.");
            redirect(&options.redirects.generic_failure)
        },
        Err(e) => {
            error!("💳️ Could not reconcile CCAvenue order callback. {e}");
            ServerError::from(e).error_response()
        },
    }
}

//----------------------------------------  Wallet callbacks  --------------------------------------------------------
route!(ccav_wallet_response_handler => Post "/ccav_wallet_response_handler" impl ReconciliationDatabase, PaymentSecrets);
/// The CCAvenue callback for seller wallet top-ups.
pub async fn ccav_wallet_response_handler<B, S>(
    form: web::Form<CcavCallbackForm>,
    api: web::Data<ReconciliationApi<B>>,
    secrets: web::Data<S>,
    options: web::Data<CallbackOptions>,
) -> HttpResponse
where
    B: ReconciliationDatabase + 'static,
    S: PaymentSecrets + 'static,
{
    let response = match decode_ccavenue(&form.into_inner(), secrets.get_ref()) {
        Ok(r) => r,
        Err(e) => {
            warn!("💳️ Could not decode CCAvenue wallet callback. {e}");
            return redirect(&options.redirects.generic_failure);
        },
    };
    reconcile_wallet(&api, &response, &options).await
}

route!(payu_wallet_success => Post "/payu_wallet_success" impl ReconciliationDatabase, PaymentSecrets);
/// The PayU success webhook for seller wallet top-ups. The status in the body is authoritative, not the route.
pub async fn payu_wallet_success<B, S>(
    form: web::Form<payu::PayuCallback>,
    api: web::Data<ReconciliationApi<B>>,
    secrets: web::Data<S>,
    options: web::Data<CallbackOptions>,
) -> HttpResponse
where
    B: ReconciliationDatabase + 'static,
    S: PaymentSecrets + 'static,
{
    handle_payu_wallet(form.into_inner(), &api, secrets.get_ref(), &options).await
}

route!(payu_wallet_failure => Post "/payu_wallet_failure" impl ReconciliationDatabase, PaymentSecrets);
/// The PayU failure webhook. Identical handling to the success route; the body decides the outcome.
pub async fn payu_wallet_failure<B, S>(
    form: web::Form<payu::PayuCallback>,
    api: web::Data<ReconciliationApi<B>>,
    secrets: web::Data<S>,
    options: web::Data<CallbackOptions>,
) -> HttpResponse
where
    B: ReconciliationDatabase + 'static,
    S: PaymentSecrets + 'static,
{
    handle_payu_wallet(form.into_inner(), &api, secrets.get_ref(), &options).await
}

async fn handle_payu_wallet<B, S>(
    callback: payu::PayuCallback,
    api: &ReconciliationApi<B>,
    secrets: &S,
    options: &CallbackOptions,
) -> HttpResponse
where
    B: ReconciliationDatabase,
    S: PaymentSecrets,
{
    if let Err(e) = callback.validate() {
        warn!("💳️ Malformed PayU wallet callback. {e}");
        return redirect(&options.redirects.generic_failure);
    }
    let credentials = secrets.payu_credentials();
    let response = match payu::verify(&callback, &credentials) {
        Ok(()) => payu::into_response(&callback),
        Err(e) => match options.verify_policy {
            VerifyPolicy::Strict => {
                warn!("💳️ PayU hash verification failed for {}. {e}. Recording the top-up as failed.", callback.txnid);
                let mut response = payu::into_response(&callback);
                response.status = "failed".to_string();
                response
            },
            VerifyPolicy::Permissive => {
                warn!("💳️ PayU hash verification failed for {}. {e}. Accepting anyway (permissive policy).", callback.txnid);
                payu::into_response(&callback)
            },
        },
    };
    reconcile_wallet(api, &response, options).await
}

async fn reconcile_wallet<B: ReconciliationDatabase>(
    api: &ReconciliationApi<B>,
    response: &GatewayResponse,
    options: &CallbackOptions,
) -> HttpResponse {
    match api.reconcile_wallet_topup(response).await {
        Ok(WalletOutcome::Credited { transaction, new_balance }) => {
            info!("💳️ Wallet top-up {} credited. Seller {} balance is now {new_balance}.", transaction.txn_id, transaction.seller_id);
            redirect(&options.redirects.wallet_success)
        },
        Ok(WalletOutcome::MarkedFailed(tx)) => {
            info!("💳️ Wallet top-up {} failed at the gateway.", tx.txn_id);
            redirect(&options.redirects.wallet_failure)
        },
        Ok(WalletOutcome::AlreadyFinalized(tx)) => redirect(finalized_wallet_url(&tx, options)),
        Err(ReconciliationError::WalletTxNotFound(id)) => {
            warn!("💳️ Wallet callback referenced unknown top-up {id}.");
            redirect(&options.redirects.generic_failure)
        },
        Err(e) => {
            error!("💳️ Could not reconcile wallet callback. {e}");
            ServerError::from(e).error_response()
        },
    }
}

fn finalized_wallet_url<'a>(tx: &WalletTransaction, options: &'a CallbackOptions) -> &'a str {
    if tx.status == WalletTxStatus::Success {
        &options.redirects.wallet_success
    } else {
        &options.redirects.wallet_failure
    }
}

//----------------------------------------  Outgoing request  --------------------------------------------------------
route!(ccav_request_handler => Post "/ccav_request_handler" impl PaymentSecrets);
/// Build the encrypted CCAvenue payment request and hand the browser an auto-submitting form.
pub async fn ccav_request_handler<S>(
    form: web::Form<CcavInitiateParams>,
    merchant: web::Data<CcAvenueConfig>,
    secrets: web::Data<S>,
) -> HttpResponse
where
    S: PaymentSecrets + 'static,
{
    let params = form.into_inner();
    if params.order_id.is_empty() || params.amount.is_empty() {
        return HttpResponse::BadRequest().json(JsonResponse::failure("order_id and amount are required"));
    }
    let plaintext = ccavenue::encode_params([
        ("merchant_id", merchant.merchant_id.as_str()),
        ("order_id", params.order_id.as_str()),
        ("amount", params.amount.as_str()),
        ("currency", params.currency.as_str()),
        ("redirect_url", merchant.redirect_url.as_str()),
        ("cancel_url", merchant.cancel_url.as_str()),
        ("billing_name", params.billing_name.as_str()),
        ("billing_email", params.billing_email.as_str()),
        ("billing_tel", params.billing_tel.as_str()),
        ("language", "EN"),
    ]);
    let key = secrets.ccavenue_working_key();
    let enc_request = ccavenue::encrypt(&plaintext, key.reveal());
    debug!("💳️ Built CCAvenue initiate request for order {}", params.order_id);
    let page = initiate_form_page(&merchant.endpoint, &enc_request, &merchant.access_code);
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(page)
}

fn initiate_form_page(endpoint: &str, enc_request: &str, access_code: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body>
<form id="nonseamless" method="post" action="{endpoint}">
<input type="hidden" id="encRequest" name="encRequest" value="{enc_request}">
<input type="hidden" name="access_code" value="{access_code}">
</form>
<script type="text/javascript">document.getElementById("nonseamless").submit();</script>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn initiate_page_carries_the_form_fields() {
        let page = initiate_form_page("https://gw.example.com/initiate", "deadbeef", "AVXC123");
        assert!(page.contains(r#"action="https://gw.example.com/initiate""#));
        assert!(page.contains(r#"name="encRequest" value="deadbeef""#));
        assert!(page.contains(r#"name="access_code" value="AVXC123""#));
        assert!(page.contains("submit()"));
    }
}
