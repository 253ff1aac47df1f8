//! HTTP API server

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::auth::{
    require_admin, require_user, AccessGate, BcryptHasher, GatePolicy, InMemoryUserStore,
    RateLimiter, SigningKeySource, TokenCodec, UserStore,
};
use crate::config::Config;
use crate::error::Result;

use super::cookies::CookieSettings;
use super::routes;

const EVICTION_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub gate: AccessGate,
    pub cookies: CookieSettings,
}

pub type SharedState = Arc<AppState>;

/// Resolve the signing secret, warning when it falls back to the built-in key
pub fn signing_key_source(config: &Config) -> SigningKeySource {
    let source = SigningKeySource::from_config(config.auth.jwt_secret.as_deref());
    match &source {
        SigningKeySource::Configured(_) => {
            tracing::debug!("Using configured token signing secret");
        }
        SigningKeySource::InsecureDefault => {
            tracing::warn!(
                "auth.jwt_secret is not set: session tokens are signed with a built-in key \
                 and can be forged by anyone. Set STOREFRONT_JWT_SECRET before deploying."
            );
        }
    }
    source
}

/// Wire the access gate and cookie settings from configuration
pub fn build_state(config: Config, store: Arc<dyn UserStore>) -> SharedState {
    let codec = TokenCodec::new(&signing_key_source(&config));
    let limiter = RateLimiter::new().eviction_threshold(config.rate_limit.eviction_threshold);
    let gate = AccessGate::new(
        Arc::new(BcryptHasher::new(config.auth.bcrypt_cost)),
        Arc::new(codec),
        store,
        limiter,
        GatePolicy::from(&config),
    );
    let cookies = CookieSettings::from(&config);

    Arc::new(AppState {
        config,
        gate,
        cookies,
    })
}

/// Run the HTTP API server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let store = InMemoryUserStore::from_seed(&config.users)?;
    tracing::info!("Loaded {} seeded user(s)", store.user_count().await);

    let state = build_state(config, Arc::new(store));
    spawn_eviction_task(state.gate.limiter().clone());

    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Periodically drop expired rate-limit entries
fn spawn_eviction_task(limiter: RateLimiter) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(EVICTION_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = limiter.evict_expired();
            if evicted > 0 {
                tracing::debug!(evicted, "Evicted expired rate limit entries");
            }
        }
    });
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    let user_routes = Router::new()
        .route("/api/auth/me", get(routes::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    let admin_routes = Router::new()
        .route("/api/admin/me", get(routes::admin_me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/auth/login", post(routes::login))
        .route("/api/auth/register", post(routes::register))
        .route("/api/auth/logout", post(routes::logout))
        .route("/api/admin/login", post(routes::admin_login))
        .route("/api/admin/logout", post(routes::admin_logout))
        .merge(user_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
