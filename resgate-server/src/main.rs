use resgate_server::{build_router, config::Config, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let app = build_router(AppState::new(&config)?);

    tracing::info!(
        addr = %config.bind_addr,
        upstream = %config.upstream_url,
        timeout = ?config.upstream_timeout,
        "resource gateway listening"
    );

    axum::Server::try_bind(&config.bind_addr)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c, graceful shutdown disabled");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}
