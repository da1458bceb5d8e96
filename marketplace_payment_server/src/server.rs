use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use marketplace_payment_engine::{
    events::{EventHandlers, EventHooks},
    notifications::{Channel, Dispatcher, EmailChannel, SmsChannel, WhatsAppChannel},
    ReconciliationApi,
    SqliteDatabase,
};

use crate::{
    config::{EnvSecrets, NotificationConfig, ServerConfig},
    data_objects::CallbackOptions,
    errors::ServerError,
    gateway_routes::{
        CcavRequestHandlerRoute,
        CcavResponseHandlerRoute,
        CcavWalletResponseHandlerRoute,
        PayuWalletFailureRoute,
        PayuWalletSuccessRoute,
    },
    routes::health,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    // One set of event handlers for the whole server, not one per worker. The producers are cheap clones.
    let dispatcher = build_dispatcher(&config.notifications);
    let hooks = if dispatcher.is_empty() {
        info!("📨️ No notification channels configured. Transitions will not send messages.");
        EventHooks::default()
    } else {
        dispatcher.into_hooks()
    };
    let handlers = EventHandlers::new(100, hooks);
    let producers = handlers.producers();
    handlers.start();
    let srv = HttpServer::new(move || {
        let api = ReconciliationApi::new(db.clone(), producers.clone());
        let options =
            CallbackOptions { redirects: config.redirects.clone(), verify_policy: config.verify_policy };
        let gateway_scope = web::scope("/api")
            .service(CcavRequestHandlerRoute::<EnvSecrets>::new())
            .service(CcavResponseHandlerRoute::<SqliteDatabase, EnvSecrets>::new())
            .service(CcavWalletResponseHandlerRoute::<SqliteDatabase, EnvSecrets>::new())
            .service(PayuWalletSuccessRoute::<SqliteDatabase, EnvSecrets>::new())
            .service(PayuWalletFailureRoute::<SqliteDatabase, EnvSecrets>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mpg::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(EnvSecrets))
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(config.ccavenue.clone()))
            .service(health)
            .service(gateway_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

fn build_dispatcher(config: &NotificationConfig) -> Dispatcher {
    let mut channels = Vec::new();
    if let Some(c) = &config.mail {
        channels.push(Channel::Email(EmailChannel::new(c.endpoint.clone(), c.api_key.clone())));
    }
    if let Some(c) = &config.sms {
        channels.push(Channel::Sms(SmsChannel::new(c.endpoint.clone(), c.api_key.clone())));
    }
    if let Some(c) = &config.whatsapp {
        channels.push(Channel::WhatsApp(WhatsAppChannel::new(c.endpoint.clone(), c.api_key.clone())));
    }
    Dispatcher::new(channels)
}
