mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = feedwire_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if config.embedding_dim != feedwire_db::EMBEDDING_DIM {
        anyhow::bail!(
            "FEEDWIRE_EMBEDDING_DIM is {} but the summary_embeddings column holds {} dimensions",
            config.embedding_dim,
            feedwire_db::EMBEDDING_DIM
        );
    }

    let pool = feedwire_db::connect_pool_from_config(&config).await?;
    feedwire_db::run_migrations(&pool).await?;

    let sources = feedwire_core::load_sources(&config.sources_path)?.sources;
    tracing::info!(sources = sources.len(), env = %config.env, "configuration loaded");
    let pipeline = Arc::new(feedwire_pipeline::Pipeline::from_config(
        &config,
        pool.clone(),
        sources,
    )?);

    let shutdown = CancellationToken::new();
    let _scheduler =
        scheduler::build_scheduler(Arc::clone(&pipeline), &config, shutdown.clone()).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        feedwire_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            pool,
            pipeline,
            shutdown: shutdown.clone(),
        },
        auth,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "feedwire-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
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

    tracing::info!("received shutdown signal, cancelling in-flight stages");
    shutdown.cancel();
}
