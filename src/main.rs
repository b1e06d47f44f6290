use std::sync::Arc;

use anyhow::Result;

use polyblog::auth::{Credentials, MemoryTokenStore};
use polyblog::config::Config;
use polyblog::db::Db;
use polyblog::http::{router, AppState};
use polyblog::store::BlogStore;
use polyblog::uploads::UploadStore;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env();

    let db = Db::open(&config.database_path)?;
    let store = BlogStore::new(db);
    store.migrate()?;
    store.ping()?;

    let uploads = UploadStore::new(&config.uploads_dir, config.max_upload_bytes)?;

    let state = AppState {
        store,
        tokens: Arc::new(MemoryTokenStore::new()),
        uploads,
        credentials: Credentials {
            username: config.admin_username.clone(),
            password: config.admin_password.clone(),
        },
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    log::info!("api listening on http://{}", config.bind_addr);
    log::info!("database at {}", config.database_path);
    log::info!("uploads served from {}/", config.uploads_dir);
    log::info!("admin user '{}'", config.admin_username);
    axum::serve(listener, app).await?;

    Ok(())
}
