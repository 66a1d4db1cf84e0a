use sharecloud::application::AppContext;
use sharecloud::config::Config;
use sharecloud::infrastructure::server;
use std::error::Error;
use std::net::TcpListener;
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting ShareCloud");

    let config = Config::from_env()?;
    if config.uses_default_credentials() {
        tracing::warn!(
            "Using the built-in demonstration admin credentials; set SHARECLOUD_ADMIN_EMAIL and SHARECLOUD_ADMIN_PASSWORD"
        );
    }

    let listen = config.listen;
    let context = AppContext::open(config)?;
    tracing::info!(
        files = context.store.len(),
        "Metadata store initialized"
    );

    let listener = TcpListener::bind(listen)?;
    server::serve(listener, context.shared(), shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}
