//! Button Pong Back binary entrypoint wiring configuration, storage, the device notifier, the
//! periodic ping manager and the REST API.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use button_pong_back::{
    config::AppConfig,
    dao::lease_store::{LeaseStore, memory::InMemoryLeaseStore},
    routes,
    services::{notifier::ParticleDeviceNotifier, ping_service},
    state::{AppState, SharedState, coordinator::LeaseCoordinator, manager::GameStateManager},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    let (store, container) = connect_store(&config).await?;
    info!(%container, lease = ?config.lease_duration.get(), "game state storage ready");

    let coordinator = LeaseCoordinator::new(store, container, config.lease_duration);
    let notifier = ParticleDeviceNotifier::new(config.device_webhook_template.clone())
        .context("building device notifier")?;
    let app_state = AppState::new(
        GameStateManager::new(coordinator),
        Arc::new(notifier),
        config,
    );

    tokio::spawn(ping_service::run(app_state.clone()));
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the storage backend from the environment: CouchDB, then MongoDB, then in-memory.
///
/// Returns the store along with the container the game record lives in.
async fn connect_store(config: &AppConfig) -> anyhow::Result<(Arc<dyn LeaseStore>, String)> {
    if let Some(found) = connect_couch().await? {
        return Ok(found);
    }
    if let Some(store) = connect_mongo().await? {
        return Ok((store, config.storage_container.clone()));
    }

    warn!("no storage backend configured; game state is kept in memory for this process only");
    Ok((
        Arc::new(InMemoryLeaseStore::new()),
        config.storage_container.clone(),
    ))
}

/// CouchDB store when `COUCH_BASE_URL` is set; its database is the lease container.
#[cfg(feature = "couch-store")]
async fn connect_couch() -> anyhow::Result<Option<(Arc<dyn LeaseStore>, String)>> {
    use button_pong_back::dao::lease_store::couchdb::{CouchConfig, CouchLeaseStore};

    if env::var_os("COUCH_BASE_URL").is_none() {
        return Ok(None);
    }
    let couch_config = CouchConfig::from_env().context("reading CouchDB configuration")?;
    let store = CouchLeaseStore::connect(couch_config)
        .await
        .context("connecting to CouchDB")?;
    info!(database = store.database(), "using CouchDB lease store");
    let container = store.database().to_string();
    Ok(Some((Arc::new(store), container)))
}

#[cfg(not(feature = "couch-store"))]
async fn connect_couch() -> anyhow::Result<Option<(Arc<dyn LeaseStore>, String)>> {
    Ok(None)
}

/// MongoDB store when `MONGO_URI` is set.
#[cfg(feature = "mongo-store")]
async fn connect_mongo() -> anyhow::Result<Option<Arc<dyn LeaseStore>>> {
    use button_pong_back::dao::lease_store::mongodb::{MongoConfig, MongoLeaseStore};

    if env::var_os("MONGO_URI").is_none() {
        return Ok(None);
    }
    let mongo_config = MongoConfig::from_env()
        .await
        .context("reading MongoDB configuration")?;
    info!(database = %mongo_config.database_name, "using MongoDB lease store");
    let store = MongoLeaseStore::connect(mongo_config)
        .await
        .context("connecting to MongoDB")?;
    Ok(Some(Arc::new(store)))
}

#[cfg(not(feature = "mongo-store"))]
async fn connect_mongo() -> anyhow::Result<Option<Arc<dyn LeaseStore>>> {
    Ok(None)
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
