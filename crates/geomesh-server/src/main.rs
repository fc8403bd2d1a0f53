mod api;
mod middleware;

use std::sync::Arc;

use geomesh_assistant::AssistantClient;
use geomesh_index::{IndexHandle, PointIndex};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::RateLimitState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = geomesh_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let index = Arc::new(IndexHandle::new(initial_index(&config)));

    let assistant = match AssistantClient::from_settings(&config.assistant) {
        Ok(client) => Some(client),
        Err(geomesh_assistant::AssistantError::MissingApiKey) => {
            tracing::warn!("OPENROUTER_API_KEY not set; only offline answers are available");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let state = AppState::from_config(&config, index, assistant);
    let app = build_app(
        state,
        RateLimitState::per_minute(config.ask_rate_limit_per_minute),
    );

    tracing::info!(
        env = %config.env,
        bind_addr = %config.bind_addr,
        dataset = %config.dataset_path.display(),
        "starting geomesh server"
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Loads the configured dataset, falling back to an empty index so the
/// server can still start and be reloaded once the file is fixed.
fn initial_index(config: &geomesh_core::AppConfig) -> PointIndex {
    let loaded = geomesh_index::load_dataset(&config.dataset_path)
        .map(geomesh_index::LoadedDataset::into_index);
    match loaded {
        Ok(Ok(index)) => index,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "dataset has no usable rows; starting with an empty index");
            PointIndex::empty()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load dataset; starting with an empty index");
            PointIndex::empty()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
