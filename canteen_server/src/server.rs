use std::{sync::Arc, time::Duration};

use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::Logger,
    web,
    web::ServiceConfig,
    App,
    HttpServer,
};
use canteen_engine::{
    events::EventProducers,
    traits::{CanteenRequestManagement, CartManagement, OrderManagement},
    AuthApi,
    CanteenRequestApi,
    CartApi,
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    integrations::{LogOnlySender, MessageSender, RazorpayClient, TwilioWhatsApp},
    middleware::JwtMiddlewareFactory,
    notifications::create_notification_handlers,
    routes::*,
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    info!("🗃️ Database at {} is ready", db.url());
    let sender: Arc<dyn MessageSender> = if config.whatsapp.is_configured() {
        let client = TwilioWhatsApp::new(config.whatsapp.clone())
            .map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Arc::new(client)
    } else {
        Arc::new(LogOnlySender)
    };
    let handlers = create_notification_handlers(sender, &config.whatsapp.country_code, config.event_buffer_size);
    let producers = handlers.producers();
    handlers.start_handlers();
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let gateway = RazorpayClient::new(config.razorpay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.strict_transitions {
        info!("🪛️ Order status changes must follow the kitchen flow");
    }
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone(), config.razorpay.key_secret.clone())
            .with_strict_transitions(config.strict_transitions);
        let cart_api = CartApi::new(db.clone());
        let catalog_api = CatalogApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let requests_api = CanteenRequestApi::new(db.clone());
        let issuer = Arc::new(TokenIssuer::new(&config.auth));
        App::new()
            .wrap(JwtMiddlewareFactory::new(Arc::clone(&issuer)))
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("canteen::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(requests_api))
            .app_data(web::Data::from(issuer))
            .app_data(web::Data::new(gateway.clone()))
            .configure(configure_extractors)
            .configure(api_routes::<SqliteDatabase>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed bodies, query strings and paths get the same JSON error shape as everything else.
pub fn configure_extractors(cfg: &mut ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ServerError::ValidationError(format!("Invalid query. {err}")).into()),
    )
    .app_data(
        web::PathConfig::default().error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into()),
    );
}

/// Registers every route. `/order/canteen` and `/order/my` must come before `/order/{id}`.
pub fn api_routes<B>(cfg: &mut ServiceConfig)
where B: OrderManagement + CartManagement + CanteenRequestManagement + 'static {
    cfg.service(health)
        .service(RegisterRoute::<B>::new())
        .service(LoginRoute::<B>::new())
        .service(MeRoute::<B>::new())
        .service(ListCanteensRoute::<B>::new())
        .service(CanteenMenuRoute::<B>::new())
        .service(SubmitCanteenRequestRoute::<B>::new())
        .service(GetCartRoute::<B>::new())
        .service(AddToCartRoute::<B>::new())
        .service(RemoveFromCartRoute::<B>::new())
        .service(ClearCartRoute::<B>::new())
        .service(CreatePaymentOrderRoute::<B>::new())
        .service(VerifyPaymentRoute::<B>::new())
        .service(CanteenOrdersRoute::<B>::new())
        .service(MyOrdersRoute::<B>::new())
        .service(OrderByIdRoute::<B>::new())
        .service(UpdateOrderStatusRoute::<B>::new())
        .service(CancelOrderRoute::<B>::new())
        .service(MyCanteensRoute::<B>::new())
        .service(ToggleCanteenRoute::<B>::new())
        .service(SetOpeningHoursRoute::<B>::new())
        .service(AddMenuItemRoute::<B>::new())
        .service(UpdateMenuItemRoute::<B>::new())
        .service(DeleteMenuItemRoute::<B>::new())
        .service(AllCanteensRoute::<B>::new())
        .service(CreateCanteenRoute::<B>::new())
        .service(UpdateCanteenRoute::<B>::new())
        .service(DeleteCanteenRoute::<B>::new())
        .service(AddCanteenAdminRoute::<B>::new())
        .service(RemoveCanteenAdminRoute::<B>::new())
        .service(ListUsersRoute::<B>::new())
        .service(ListCanteenRequestsRoute::<B>::new())
        .service(ApproveCanteenRequestRoute::<B>::new());
}
