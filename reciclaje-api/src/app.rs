//! Application state and router builder
//!
//! # Example
//!
//! ```no_run
//! use reciclaje_api::{app::{build_router, AppState}, config::Config};
//! use sqlx::PgPool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = PgPool::connect(&config.database.url).await?;
//! let app = build_router(AppState::new(pool, config));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use crate::{
    config::Config,
    middleware::{security::SecurityHeadersLayer, session::route_guard},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use reciclaje_shared::mail::{DisabledMailer, HttpMailer, Mailer};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Builds the state; the mailer follows `config.mail`
    pub fn new(db: PgPool, config: Config) -> Self {
        let mailer: Arc<dyn Mailer> = match config.mail.clone() {
            Some(mail) => match HttpMailer::new(mail) {
                Ok(mailer) => {
                    info!("Mail delivery enabled");
                    Arc::new(mailer)
                }
                Err(e) => {
                    warn!(error = %e, "Mail client unavailable, e-mails will be dropped");
                    Arc::new(DisabledMailer)
                }
            },
            None => {
                info!("Mail delivery disabled (MAIL_API_URL, MAIL_API_KEY and MAIL_FROM not all set)");
                Arc::new(DisabledMailer)
            }
        };

        Self::with_mailer(db, config, mailer)
    }

    pub fn with_mailer(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the router with every route and middleware
///
/// ```text
/// /health                                 GET
/// /api/update-password                    POST   {userId, password}
/// /dashboard /perfil /notificaciones      GET    page view models
/// /publicar                               GET    listing form data
/// /mensajes                               GET    inbox
/// /mensajes/:id                           GET    conversation, POST form send
/// /contactar                              POST   form contact
/// /v1/auth/{register,login,logout,refresh} POST
/// /v1/roles /v1/materials                 GET
/// /v1/listings                            GET POST
/// /v1/listings/:id                        GET PATCH
/// /v1/listings/:id/ratings                GET POST
/// /v1/users/me                            GET PATCH
/// /v1/users/:id                           GET
/// /v1/locations                           GET POST
/// /v1/locations/:id                       DELETE
/// /v1/conversations                       GET POST
/// /v1/conversations/:id/messages          GET POST
/// /v1/conversations/:id/read              POST
/// /v1/messages/:id/read                   POST
/// /v1/notifications                       GET
/// /v1/notifications/read-all              POST
/// /v1/notifications/:id/read              POST
/// /v1/history                             GET
/// ```
///
/// Layers, outermost first: security headers, CORS, tracing, route guard.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/refresh", post(routes::auth::refresh));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .route("/roles", get(routes::auth::list_roles))
        .route("/materials", get(routes::listings::list_materials))
        .route(
            "/listings",
            get(routes::listings::list_listings).post(routes::listings::create_listing),
        )
        .route(
            "/listings/:id",
            get(routes::listings::get_listing).patch(routes::listings::update_listing),
        )
        .route(
            "/listings/:id/ratings",
            get(routes::ratings::list_ratings).post(routes::ratings::create_rating),
        )
        .route("/users/me", get(routes::users::get_me).patch(routes::users::update_me))
        .route("/users/:id", get(routes::users::get_user))
        .route(
            "/locations",
            get(routes::locations::list_locations).post(routes::locations::create_location),
        )
        .route("/locations/:id", delete(routes::locations::delete_location))
        .route(
            "/conversations",
            get(routes::conversations::list_conversations).post(routes::conversations::start_conversation),
        )
        .route(
            "/conversations/:id/messages",
            get(routes::conversations::list_messages).post(routes::conversations::send_message),
        )
        .route("/conversations/:id/read", post(routes::conversations::mark_conversation_read))
        .route("/messages/:id/read", post(routes::conversations::mark_message_read))
        .route("/notifications", get(routes::notifications::list_notifications))
        .route("/notifications/read-all", post(routes::notifications::mark_all_read))
        .route("/notifications/:id/read", post(routes::notifications::mark_read))
        .route("/history", get(routes::history::list_history));

    let page_routes = Router::new()
        .route("/dashboard", get(routes::pages::dashboard))
        .route("/perfil", get(routes::pages::profile))
        .route("/notificaciones", get(routes::pages::notifications))
        .route("/publicar", get(routes::pages::publish))
        .route("/mensajes", get(routes::pages::inbox))
        .route(
            "/mensajes/:id",
            get(routes::pages::conversation).post(routes::pages::send_message_form),
        )
        .route("/contactar", post(routes::pages::contact));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/update-password", post(routes::password::update_password))
        .merge(page_routes)
        .nest("/v1", v1_routes)
        .layer(axum::middleware::from_fn_with_state(state.clone(), route_guard))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
