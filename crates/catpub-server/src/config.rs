//! Configuration management
//!
//! All configuration is loaded once at startup into an explicit [`Config`]
//! value; pipeline components never read environment variables themselves.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/catpub";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Default staging insert batch size (rows per INSERT).
pub const DEFAULT_STAGING_BATCH_SIZE: usize = 200;

/// Default timeout for the external media ingest script, in seconds.
pub const DEFAULT_INGEST_TIMEOUT_SECS: u64 = 600;

/// Default number of image folders moved concurrently.
pub const DEFAULT_MOVE_CONCURRENCY: usize = 4;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub pipeline: PipelineConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Publish pipeline configuration
///
/// The three filesystem roots are shared mutable trees; the pipeline assumes
/// exclusive access for the duration of a run (enforced by the server-wide
/// publish lock).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root of the draft image tree (`{root}/{run_folder}/{spu}`).
    pub draft_image_root: PathBuf,
    /// Root of the live image tree (`{root}/{spu}`).
    pub live_image_root: PathBuf,
    /// Where run folders are copied before anything destructive happens.
    pub archive_root: PathBuf,
    /// External script that republishes moved images into the serving layer.
    pub ingest_script: PathBuf,
    /// Rows per staging INSERT statement.
    pub staging_batch_size: usize,
    /// Upper bound on one ingest script invocation.
    pub ingest_timeout_secs: u64,
    /// Image folders moved concurrently during the move phase.
    pub move_concurrency: usize,
}

impl Config {
    /// Load configuration from environment and defaults
    ///
    /// The pipeline roots and the ingest script path have no defaults; a
    /// missing value fails startup rather than surfacing mid-run.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("CATPUB_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: std::env::var("CATPUB_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: std::env::var("CATPUB_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MIN_CONNECTIONS),
                connect_timeout_secs: std::env::var("DATABASE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                allow_credentials: std::env::var("CORS_ALLOW_CREDENTIALS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
            },
            pipeline: PipelineConfig {
                draft_image_root: required_path("DRAFT_IMAGE_ROOT")?,
                live_image_root: required_path("LIVE_IMAGE_ROOT")?,
                archive_root: required_path("ARCHIVE_ROOT")?,
                ingest_script: required_path("MEDIA_INGEST_SCRIPT")?,
                staging_batch_size: std::env::var("STAGING_BATCH_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_STAGING_BATCH_SIZE),
                ingest_timeout_secs: std::env::var("MEDIA_INGEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_INGEST_TIMEOUT_SECS),
                move_concurrency: std::env::var("MOVE_CONCURRENCY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_MOVE_CONCURRENCY),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.pipeline.staging_batch_size == 0 {
            anyhow::bail!("Staging batch size must be greater than 0");
        }

        if self.pipeline.move_concurrency == 0 {
            anyhow::bail!("Move concurrency must be greater than 0");
        }

        if self.pipeline.draft_image_root == self.pipeline.live_image_root {
            anyhow::bail!("Draft and live image roots must differ");
        }

        Ok(())
    }
}

fn required_path(var: &str) -> anyhow::Result<PathBuf> {
    let value =
        std::env::var(var).map_err(|_| anyhow::anyhow!("{} must be set", var))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} must not be empty", var);
    }
    Ok(PathBuf::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pipeline() -> PipelineConfig {
        PipelineConfig {
            draft_image_root: PathBuf::from("/data/draft"),
            live_image_root: PathBuf::from("/data/live"),
            archive_root: PathBuf::from("/data/archive"),
            ingest_script: PathBuf::from("/opt/ingest.sh"),
            staging_batch_size: DEFAULT_STAGING_BATCH_SIZE,
            ingest_timeout_secs: DEFAULT_INGEST_TIMEOUT_SECS,
            move_concurrency: DEFAULT_MOVE_CONCURRENCY,
        }
    }

    fn sample_config() -> Config {
        Config {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            pipeline: sample_pipeline(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn identical_roots_are_rejected() {
        let mut config = sample_config();
        config.pipeline.live_image_root = config.pipeline.draft_image_root.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut config = sample_config();
        config.pipeline.staging_batch_size = 0;
        assert!(config.validate().is_err());
    }
}
