use anyhow::{Context, Result};
use facematch_core::{Analyzer, Gallery, PRELOADED_FACES_URL_BASE};
use facematch_facepp::FacePlusPlus;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("facematchd starting");

    let config = config::Config::load().context("loading configuration")?;
    let addr = config.bind_addr()?;

    // Listed once; faces added later need a restart.
    let gallery = Gallery::load(config.gallery_dir(), PRELOADED_FACES_URL_BASE)?;
    let comparer = FacePlusPlus::new(config.facepp.clone())?;
    let analyzer = Analyzer::new(gallery, Arc::new(comparer), config.match_names.clone());

    let app = server::router(
        server::AppState::new(analyzer),
        &config.static_dir,
        config.max_upload_bytes,
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, static_dir = %config.static_dir.display(), "facematchd ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("facematchd shutting down");
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on unix (container stop).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
