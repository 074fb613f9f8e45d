pub mod application;
pub mod config;
pub mod console;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use application::broadcast_service::BroadcastService;
use application::order_service::OrderService;
use config::AppConfig;
use domain::ports::{NotificationPublisher, NotificationRepository, OrderRepository, TokenVerifier};
use infrastructure::hub::InMemoryHub;
use infrastructure::notification_repo::DieselNotificationRepository;
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::token::HmacTokenVerifier;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type SharedOrderService = OrderService<Arc<dyn OrderRepository>>;
pub type SharedBroadcastService =
    BroadcastService<Arc<dyn NotificationRepository>, Arc<dyn NotificationPublisher>>;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Everything the HTTP layer needs, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<SharedOrderService>,
    pub broadcasts: Arc<SharedBroadcastService>,
    pub hub: Arc<dyn NotificationPublisher>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
        hub: Arc<dyn NotificationPublisher>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        let broadcasts = Arc::new(BroadcastService::new(notification_repo, hub.clone()));
        let orders = Arc::new(OrderService::new(order_repo, broadcasts.clone()));
        Self {
            orders,
            broadcasts,
            hub,
            verifier,
        }
    }

    /// Diesel repositories over `pool`, an in-memory hub and HMAC tokens.
    pub fn from_pool(pool: DbPool, config: &AppConfig) -> Self {
        Self::new(
            Arc::new(DieselOrderRepository::new(pool.clone())),
            Arc::new(DieselNotificationRepository::new(pool)),
            Arc::new(InMemoryHub::new(config.hub_channel_capacity)),
            Arc::new(HmacTokenVerifier::new(config.auth_token_secret.as_bytes())),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::hub::connect,
        handlers::notifications::list_notifications,
        handlers::notifications::read_notification,
        handlers::notifications::read_all_notifications,
        handlers::notifications::notify_all_users,
        handlers::notifications::notify_all_admins,
        handlers::notifications::notify_user,
        handlers::notifications::send_chat,
        handlers::notifications::signal_user,
        handlers::orders::list_my_orders,
        handlers::orders::get_my_order,
        handlers::orders::list_all_orders,
        handlers::orders::search_orders,
        handlers::orders::get_order_details,
        handlers::orders::delete_order,
        handlers::orders::update_order_status,
    ),
    components(schemas(
        handlers::notifications::NotificationRequest,
        handlers::notifications::NotificationResponse,
        handlers::notifications::ReadResponse,
        handlers::notifications::ReadAllResponse,
        handlers::notifications::ChatRequest,
        handlers::notifications::DeliveryResponse,
        handlers::orders::OrderResponse,
        handlers::orders::OrderDetailResponse,
        handlers::orders::OrderSummaryResponse,
        handlers::orders::OrderSummaryPageResponse,
        handlers::orders::OrderDetailsEnvelope,
        handlers::orders::OrderDetailsResponse,
        handlers::orders::OrderDetailsProductResponse,
        handlers::orders::ProductImageResponse,
        handlers::orders::DeleteOrderResponse,
        handlers::orders::UpdateStatusRequest,
        domain::order::OrderStatus,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "hub", description = "Real-time push channel"),
        (name = "notifications", description = "Stored notifications and their read state"),
        (name = "chat", description = "Unstored chat pushes"),
        (name = "orders", description = "The caller's own orders"),
        (name = "admin", description = "Order administration"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Register the shared state and every route on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    use handlers::{hub, notifications, orders};

    cfg.app_data(web::Data::from(state.orders.clone()))
        .app_data(web::Data::from(state.broadcasts.clone()))
        .app_data(web::Data::from(state.hub.clone()))
        .app_data(web::Data::from(state.verifier.clone()))
        .route("/hub", web::get().to(hub::connect))
        .service(
            web::scope("/notifications")
                .route("", web::get().to(notifications::list_notifications))
                .route("/read-all", web::put().to(notifications::read_all_notifications))
                .route("/all", web::post().to(notifications::notify_all_users))
                .route("/admins", web::post().to(notifications::notify_all_admins))
                .route("/users/{user_id}", web::post().to(notifications::notify_user))
                .route("/{id}/read", web::put().to(notifications::read_notification)),
        )
        .service(
            web::scope("/chat")
                .route("", web::post().to(notifications::send_chat))
                .route("/signal/{user_id}", web::post().to(notifications::signal_user)),
        )
        .service(
            web::scope("/orders")
                .route("", web::get().to(orders::list_my_orders))
                .route("/{id}", web::get().to(orders::get_my_order)),
        )
        .service(
            web::scope("/admin/orders")
                .route("", web::get().to(orders::list_all_orders))
                .route("/search", web::get().to(orders::search_orders))
                .route("/{id}/details", web::get().to(orders::get_order_details))
                .route("/{id}/status", web::put().to(orders::update_order_status))
                .route("/{id}", web::delete().to(orders::delete_order)),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| configure(cfg, &state))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
