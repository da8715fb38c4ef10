//! Configuration module
//!
//! Process configuration for the cataloging service: server, database,
//! object storage and cataloging behavior. Loaded once from the environment
//! (and `.env` via dotenvy) and validated before anything else starts.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 50;
const CATALOG_OPERATION_TIMEOUT_SECS: u64 = 60;
const DEFAULT_BUCKET_REGION: &str = "us-east-1";
/// Headroom on top of the file limit for the other multipart fields.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// What to do with an uploaded object when the media record could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Remove the uploaded object (best-effort).
    #[default]
    Delete,
    /// Leave the object in place and log its key.
    Keep,
}

impl FromStr for OrphanPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delete" => Ok(OrphanPolicy::Delete),
            "keep" => Ok(OrphanPolicy::Keep),
            _ => Err(anyhow::anyhow!("Invalid orphan policy: {}", s)),
        }
    }
}

/// S3 / MinIO adapter settings.
///
/// Built completely before the adapter is constructed and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO etc.)
    pub endpoint: Option<String>,
    pub public_read: bool,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalStorageConfig {
    pub path: String,
    pub base_url: String,
}

/// Cataloging behavior knobs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogSettings {
    pub max_file_size_bytes: usize,
    pub operation_timeout_secs: u64,
    pub orphan_policy: OrphanPolicy,
}

impl CatalogSettings {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            operation_timeout_secs: CATALOG_OPERATION_TIMEOUT_SECS,
            orphan_policy: OrphanPolicy::Delete,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub storage_backend: StorageBackend,
    pub s3: Option<S3StorageConfig>,
    pub local: Option<LocalStorageConfig>,
    pub catalog: CatalogSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) => StorageBackend::S3,
        };

        let s3 = env::var("STORAGE_BUCKET_NAME")
            .ok()
            .filter(|b| !b.trim().is_empty())
            .map(|bucket| S3StorageConfig {
                bucket,
                region: env::var("STORAGE_BUCKET_REGION")
                    .unwrap_or_else(|_| DEFAULT_BUCKET_REGION.to_string()),
                endpoint: env::var("STORAGE_ENDPOINT")
                    .ok()
                    .filter(|e| !e.trim().is_empty()),
                public_read: env::var("STORAGE_PUBLIC_READ")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok())
                    .unwrap_or(true),
                access_key_id: env::var("STORAGE_ACCESS_KEY_ID").ok(),
                secret_access_key: env::var("STORAGE_SECRET_ACCESS_KEY").ok(),
            });

        let local = match (
            env::var("LOCAL_STORAGE_PATH"),
            env::var("LOCAL_STORAGE_BASE_URL"),
        ) {
            (Ok(path), Ok(base_url)) => Some(LocalStorageConfig { path, base_url }),
            _ => None,
        };

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);
        let max_file_size_bytes = max_file_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                anyhow::anyhow!("MAX_FILE_SIZE_MB is too large: {}", max_file_size_mb)
            })?;

        let orphan_policy = match env::var("ORPHAN_POLICY") {
            Ok(value) => value.parse::<OrphanPolicy>()?,
            Err(_) => OrphanPolicy::default(),
        };

        let config = Config {
            server_port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            environment,
            cors_origins,
            database_url,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3,
            local,
            catalog: CatalogSettings {
                max_file_size_bytes,
                operation_timeout_secs: env::var("CATALOG_OPERATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(CATALOG_OPERATION_TIMEOUT_SECS),
                orphan_policy,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        matches!(
            self.environment.to_lowercase().as_str(),
            "production" | "prod"
        )
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.database_url.starts_with("postgres://")
            || self.database_url.starts_with("postgresql://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.catalog.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self
            .catalog
            .max_file_size_bytes
            .checked_add(MULTIPART_OVERHEAD_BYTES)
            .is_none()
        {
            return Err(anyhow::anyhow!(
                "MAX_FILE_SIZE_MB is too large: request body limit would overflow"
            ));
        }

        if self.catalog.operation_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "CATALOG_OPERATION_TIMEOUT_SECS must be greater than 0"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3.is_none() {
                    return Err(anyhow::anyhow!(
                        "STORAGE_BUCKET_NAME must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.catalog.max_file_size_bytes
    }

    /// Largest request body accepted: the file limit plus multipart overhead.
    pub fn request_body_limit(&self) -> usize {
        self.catalog
            .max_file_size_bytes
            .saturating_add(MULTIPART_OVERHEAD_BYTES)
    }
}
