use anyhow::Result;
use axum::Router;
use std::io::ErrorKind;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod imaging;
mod models;
mod paths;
mod routes;
mod services;
mod storage;
mod transcode;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + optional batch job ---
    let (cfg, transcode_job) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting media-gallery with config: {:?}", cfg);

    // --- Connect the object store (credential selection happens once here) ---
    let store = storage::connect(&cfg).await?;

    // --- Handle batch transcode mode ---
    if let Some(job) = transcode_job {
        transcode::run(store, job).await?;
        tracing::info!("Transcode batch complete.");
        return Ok(()); // exit after the batch
    }

    // --- Build router ---
    let state = routes::routes::AppState::new(store);
    let app: Router = routes::routes::routes().with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
