use std::env;

/// Runtime configuration, read from the process environment with defaults
/// matching a local development setup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub database_path: String,
    pub uploads_dir: String,
    pub admin_username: String,
    pub admin_password: String,
    pub max_upload_bytes: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(5000);

        Self {
            bind_addr: format!("0.0.0.0:{port}"),
            database_path: env_or("DATABASE_PATH", "polyblog.db"),
            uploads_dir: env_or("UPLOADS_DIR", "uploads"),
            admin_username: env_or("ADMIN_USERNAME", "admin"),
            admin_password: env_or("ADMIN_PASSWORD", "admin123"),
            max_upload_bytes: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10 * 1024 * 1024),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
