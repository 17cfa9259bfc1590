use std::sync::Arc;

use tracing::{Level, info};

use common::ImageStore;
use server::config::AppConfig;
use server::database;
use server::state::AppState;

/// Make sure the directory behind a `sqlite://` URL exists before connecting.
fn prepare_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = std::path::Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    prepare_sqlite_dir(&config.database.url)?;
    let db = database::init_db(&config.database.url).await?;

    let images = Arc::new(ImageStore::new(config.storage.upload_dir.clone()).await?);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState { db, images, config };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
