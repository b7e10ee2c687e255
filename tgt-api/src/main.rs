use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tgt_api::middleware::CircuitBreaker;
use tgt_api::notify::{LogNotifier, Notifier, SlackNotifier};
use tgt_api::{app, state::AppState, worker};
use tgt_core::payment::WebhookVerifier;
use tgt_store::{KeyValueStore, MemoryStore, RedisClient};
use tgt_transfers::TransferCatalog;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tgt_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = tgt_store::app_config::Config::load().context("Failed to load config")?;
    tracing::info!("Starting Tima Green Tours API on port {}", config.server.port);

    let store: Arc<dyn KeyValueStore> = match config.redis.url.as_deref() {
        Some(url) => Arc::new(RedisClient::new(url).await.context("Failed to connect to Redis")?),
        None => {
            tracing::warn!("No Redis URL configured, using the in-memory store");
            let memory: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
            tokio::spawn(worker::start_store_sweeper(memory.clone(), SWEEP_INTERVAL));
            memory
        }
    };

    let flights = tgt_flights::build_provider(&config.flights).context("Failed to build flight provider")?;
    let flight_breaker = Arc::new(CircuitBreaker::new(
        flights.name(),
        config.flights.circuit_breaker_threshold,
        Duration::from_secs(config.flights.circuit_breaker_reset_seconds),
    ));

    if config.stripe.webhook_secret.is_empty() {
        anyhow::bail!("stripe.webhook_secret must be set");
    }
    let verifier = Arc::new(WebhookVerifier::new(
        config.stripe.webhook_secret.clone(),
        config.stripe.tolerance_seconds,
    ));

    let notifier: Arc<dyn Notifier> = match config.notifications.slack_webhook_url.as_deref() {
        Some(url) => Arc::new(SlackNotifier::new(url).context("Failed to build Slack client")?),
        None => Arc::new(LogNotifier),
    };

    let app_state = AppState {
        store,
        flights,
        flight_breaker,
        verifier,
        notifier,
        catalog: TransferCatalog::standard(),
        cache: config.cache.clone(),
        business_rules: config.business_rules.clone(),
        allowed_origins: config.server.allowed_origins.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
