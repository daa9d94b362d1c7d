use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl CloudinaryConfig {
    pub fn init() -> Result<Self> {
        let cloud_name = std::env::var("CLOUDINARY_CLOUD_NAME")
            .context("Missing environment variable: CLOUDINARY_CLOUD_NAME")?;

        let api_key = std::env::var("CLOUDINARY_API_KEY")
            .context("Missing environment variable: CLOUDINARY_API_KEY")?;

        let api_secret = std::env::var("CLOUDINARY_API_SECRET")
            .context("Missing environment variable: CLOUDINARY_API_SECRET")?;

        let base_url = std::env::var("CLOUDINARY_BASE_URL")
            .unwrap_or_else(|_| "https://api.cloudinary.com".to_string());

        let timeout_secs = std::env::var("CLOUDINARY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("CLOUDINARY_TIMEOUT_SECS must be a valid u64 integer")?;

        Ok(Self {
            cloud_name,
            api_key,
            api_secret,
            base_url,
            timeout_secs,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub run_migrations: bool,
    pub port: u16,
    pub db_max_connections: u32,
    pub upload_dir: PathBuf,
    pub otel_endpoint: String,
    pub is_dev: bool,
    pub enable_file_log: bool,
    pub cloudinary: CloudinaryConfig,
}

impl Config {
    pub fn init() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("Missing environment variable: DATABASE_URL")?;
        let run_migrations_str = std::env::var("RUN_MIGRATIONS")
            .context("Missing environment variable: RUN_MIGRATIONS")?;
        let port_str = std::env::var("PORT").context("Missing environment variable: PORT")?;

        let run_migrations = parse_bool("RUN_MIGRATIONS", &run_migrations_str)?;

        let port = port_str
            .parse::<u16>()
            .context("PORT must be a valid u16 integer")?;

        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid u32 integer")?;

        let upload_dir = std::env::var("UPLOAD_TMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./public/temp"));

        let otel_endpoint = std::env::var("OTEL_ENDPOINT")
            .unwrap_or_else(|_| "http://otel-collector:4317".to_string());

        let is_dev = std::env::var("DEV_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let enable_file_log = std::env::var("ENABLE_FILE_LOG")
            .map(|v| v == "true")
            .unwrap_or(false);

        let cloudinary = CloudinaryConfig::init().context("failed cloudinary config")?;

        Ok(Self {
            database_url,
            run_migrations,
            port,
            db_max_connections,
            upload_dir,
            otel_endpoint,
            is_dev,
            enable_file_log,
            cloudinary,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(anyhow!("{key} must be 'true' or 'false', got '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_only_literals() {
        assert!(parse_bool("RUN_MIGRATIONS", "true").unwrap());
        assert!(!parse_bool("RUN_MIGRATIONS", "false").unwrap());

        let err = parse_bool("RUN_MIGRATIONS", "yes").unwrap_err();
        assert!(err.to_string().contains("RUN_MIGRATIONS"));
    }
}
