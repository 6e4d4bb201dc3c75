//! Configuration module
//!
//! Configuration is read from the environment once at startup and then shared by
//! reference. Nothing in the service reads the environment after `Config::from_env`.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 8091;
const MAX_VIDEO_SIZE_MB: usize = 1024;
const MAX_THUMBNAIL_SIZE_MB: usize = 10;
const MEDIA_TOOL_TIMEOUT_SECS: u64 = 300;

/// Settings shared by every part of the service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
}

/// Object storage settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

/// Upload limits, allow-lists and external tool settings
#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub max_video_size_bytes: usize,
    pub video_allowed_content_types: Vec<String>,
    pub max_thumbnail_size_bytes: usize,
    pub thumbnail_allowed_content_types: Vec<String>,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub media_tool_timeout_secs: u64,
    /// Directory for per-request scratch files. `None` uses the OS temp dir.
    pub scratch_dir: Option<PathBuf>,
    /// Directory served under `/assets` (thumbnails).
    pub assets_root: PathBuf,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub database_url: String,
    pub storage: StorageConfig,
    pub media: MediaConfig,
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn mb_to_bytes(var: &str, mb: usize) -> Result<usize, anyhow::Error> {
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("{} is too large: {} MB", var, mb))
}

fn parse_size_mb(var: &str, default_mb: usize) -> Result<usize, anyhow::Error> {
    let mb = env::var(var)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(default_mb);
    mb_to_bytes(var, mb)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
        };

        let backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::S3,
        };

        let storage = StorageConfig {
            backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
        };

        let media = MediaConfig {
            max_video_size_bytes: parse_size_mb("MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB)?,
            video_allowed_content_types: parse_list(
                &env::var("VIDEO_ALLOWED_CONTENT_TYPES").unwrap_or_else(|_| "video/mp4".to_string()),
            ),
            max_thumbnail_size_bytes: parse_size_mb("MAX_THUMBNAIL_SIZE_MB", MAX_THUMBNAIL_SIZE_MB)?,
            thumbnail_allowed_content_types: parse_list(
                &env::var("THUMBNAIL_ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| "image/jpeg,image/png".to_string()),
            ),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            media_tool_timeout_secs: env::var("MEDIA_TOOL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MEDIA_TOOL_TIMEOUT_SECS),
            scratch_dir: env::var("SCRATCH_DIR").ok().map(PathBuf::from),
            assets_root: PathBuf::from(
                env::var("ASSETS_ROOT").unwrap_or_else(|_| "./assets".to_string()),
            ),
        };

        Ok(Config {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage,
            media,
        })
    }

    /// Check configuration invariants; fail fast at startup.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.trim().is_empty() {
            return Err(anyhow::anyhow!("JWT_SECRET cannot be empty"));
        }
        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        if self.media.max_video_size_bytes == 0 || self.media.max_thumbnail_size_bytes == 0 {
            return Err(anyhow::anyhow!("Upload size limits must be greater than zero"));
        }
        if self.media.video_allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!("VIDEO_ALLOWED_CONTENT_TYPES cannot be empty"));
        }
        if self.media.thumbnail_allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_ALLOWED_CONTENT_TYPES cannot be empty"
            ));
        }
        if self.media.media_tool_timeout_secs == 0 {
            return Err(anyhow::anyhow!("MEDIA_TOOL_TIMEOUT_SECS cannot be 0"));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none()
                    || self.storage.local_storage_base_url.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when using local storage"
                    ));
                }
            }
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn media_tool_timeout(&self) -> Duration {
        Duration::from_secs(self.media.media_tool_timeout_secs)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.media
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
