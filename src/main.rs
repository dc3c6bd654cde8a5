//! Arcade Board Back binary entrypoint wiring the REST API, photo storage and player store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arcade_board_back::{
    config::AppConfig,
    dao::{photo_store::FsPhotoStore, player_store::memory::MemoryPlayerStore},
    routes,
    state::{AppState, SharedState},
};

/// Player store backends selectable through `STORE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreBackend {
    Memory,
    Mongo,
}

impl StoreBackend {
    fn from_env() -> anyhow::Result<Self> {
        match env::var("STORE_BACKEND") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "memory" => Ok(Self::Memory),
                "mongo" | "mongodb" => Ok(Self::Mongo),
                other => bail!("unknown STORE_BACKEND `{other}` (expected `memory` or `mongo`)"),
            },
            Err(_) if cfg!(feature = "mongo-store") => Ok(Self::Mongo),
            Err(_) => Ok(Self::Memory),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let photo_store = FsPhotoStore::open(config.upload_dir())
        .await
        .context("opening upload directory")?;
    let app_state = AppState::new(config, Arc::new(photo_store));

    match StoreBackend::from_env()? {
        StoreBackend::Memory => {
            info!("using in-memory player store; data is lost on restart");
            app_state
                .set_player_store(Arc::new(MemoryPlayerStore::new()))
                .await;
        }
        StoreBackend::Mongo => spawn_mongo_supervisor(&app_state)?,
    }

    // Build the HTTP router once the shared state is ready.
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

/// Keep (re)connecting to MongoDB in the background; the API stays degraded until it succeeds.
#[cfg(feature = "mongo-store")]
fn spawn_mongo_supervisor(state: &SharedState) -> anyhow::Result<()> {
    use arcade_board_back::{
        dao::{
            player_store::{
                PlayerStore,
                mongodb::{MongoConfig, MongoPlayerStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    tokio::spawn(storage_supervisor::run(state.clone(), || async {
        let config = MongoConfig::from_env().await?;
        let store = MongoPlayerStore::connect(config).await?;
        Ok::<Arc<dyn PlayerStore>, StorageError>(Arc::new(store))
    }));
    Ok(())
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_mongo_supervisor(_state: &SharedState) -> anyhow::Result<()> {
    bail!("STORE_BACKEND=mongo requires building with the `mongo-store` feature")
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

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
