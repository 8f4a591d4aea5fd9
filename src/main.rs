//! Photo contest backend entrypoint wiring the REST API to its storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use photo_contest_back::{
    config::AppConfig,
    dao::contest_store::memory::MemoryStore,
    routes,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());
    let backend = env::var(STORAGE_BACKEND_ENV).unwrap_or_else(|_| "mongo".into());
    start_storage(&app_state, &backend).await?;

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the selected storage backend; MongoDB is supervised in the background.
async fn start_storage(state: &SharedState, backend: &str) -> anyhow::Result<()> {
    match backend.trim().to_ascii_lowercase().as_str() {
        "memory" => {
            info!("using in-memory storage; data is lost on restart");
            state.install_store(Arc::new(MemoryStore::new())).await;
            Ok(())
        }
        "mongo" | "mongodb" => start_mongo(state),
        other => anyhow::bail!("unknown {STORAGE_BACKEND_ENV} `{other}`"),
    }
}

#[cfg(feature = "mongo-store")]
fn start_mongo(state: &SharedState) -> anyhow::Result<()> {
    use photo_contest_back::{
        dao::{
            contest_store::{
                Store,
                mongodb::{MongoConfig, MongoContestStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    let uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let db_name = env::var("MONGO_DB").ok();

    let connect = move || {
        let uri = uri.clone();
        let db_name = db_name.clone();
        async move {
            let config = MongoConfig::from_uri(&uri, db_name.as_deref()).await?;
            let store = MongoContestStore::connect(config).await?;
            Ok::<Arc<dyn Store>, StorageError>(Arc::new(store))
        }
    };

    tokio::spawn(storage_supervisor::run(state.clone(), connect));
    Ok(())
}

#[cfg(not(feature = "mongo-store"))]
fn start_mongo(_state: &SharedState) -> anyhow::Result<()> {
    anyhow::bail!("built without the `mongo-store` feature; set {STORAGE_BACKEND_ENV}=memory")
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
