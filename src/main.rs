use tracing_subscriber::EnvFilter;

use carelink::{api, config, db};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let db_path = config::database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = db::open_database(&db_path)?;
    tracing::info!(path = %db_path.display(), "Database opened");

    let ctx = api::ApiContext::new(conn);
    let addr = config::bind_addr()?;
    let mut server = api::start_portal_server(ctx, addr).await.map_err(std::io::Error::other)?;
    tracing::info!(addr = %server.addr, "Portal listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    server.shutdown();
    server.wait().await;

    Ok(())
}
