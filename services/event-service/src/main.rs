use beacon_common::{bind_listener, init_tracing, shutdown_signal};
use std::{process::ExitCode, sync::Arc};

use event_service::app;
use event_service::config::{ServiceConfig, StoreBackend};
use event_service::db::PgEventStore;
use event_service::state::AppState;
use event_service::store::{with_timeout, EventStore, MemoryEventStore};

#[tokio::main]
async fn main() -> ExitCode {
    let _guards = init_tracing("event-service");

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    // No retry: a store that is down at boot is a deployment error.
    let store: Arc<dyn EventStore> = match &config.store {
        StoreBackend::Postgres { database_url } => {
            let opened = with_timeout(
                "open event store",
                config.store_timeout,
                PgEventStore::open(database_url, config.store_timeout),
            )
            .await;
            match opened {
                Ok(store) => Arc::new(store),
                Err(err) => {
                    tracing::error!(error = %err, "event store unavailable, exiting");
                    return ExitCode::FAILURE;
                }
            }
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory event store");
            Arc::new(MemoryEventStore::new())
        }
    };

    let app = app::build_router(AppState::new(store.clone(), config.store_timeout));
    let listener = match bind_listener(config.port).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, port = config.port, "bind listener failed");
            store.close().await;
            return ExitCode::FAILURE;
        }
    };

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    store.close().await;

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server error");
            ExitCode::FAILURE
        }
    }
}
