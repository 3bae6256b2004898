use std::sync::Arc;

use axum::{Router, routing::get};
use orgwarden_access::InMemorySessionStore;
use orgwarden_github::{GithubEndpoints, GithubMembershipClient, GithubOAuthClient};
use orgwarden_server::{CurrentPrincipal, SecurityProvider, ServerConfig};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    let provider_config = config
        .provider_config()
        .expect("invalid GitHub provider configuration");
    tracing::info!(
        organization = %provider_config.organization(),
        ttl_seconds = provider_config.ttl_seconds(),
        "Loaded configuration"
    );

    let endpoints = GithubEndpoints::default();
    let transport = GithubOAuthClient::new(&provider_config, &endpoints)
        .expect("failed to create GitHub OAuth client");
    let oracle = GithubMembershipClient::new(&endpoints.api_base, provider_config.oracle_timeout())
        .expect("failed to create GitHub membership client");

    let store = Arc::new(InMemorySessionStore::with_lifetime(config.session.duration()));

    // Spawn periodic session cleanup task
    let cleanup_store = store.clone();
    let cleanup_interval = config.session.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let count = cleanup_store.delete_expired().await;
            if count > 0 {
                tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
            }
        }
    });

    let security = SecurityProvider::new(
        provider_config,
        Arc::new(transport),
        Arc::new(oracle),
        store,
        config.session,
    );

    let protected = Router::new().route("/", get(home));

    let app = security
        .authorize(protected)
        .merge(security.authenticate_routes())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn home(CurrentPrincipal(principal): CurrentPrincipal) -> String {
    format!("Welcome, {}", principal.username())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
