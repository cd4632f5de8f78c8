//! Configuration loader for the `bioreactor-sensorflow` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Reader settings are grouped in [`IngestConfig`] so
//! library users can build one directly without touching the environment.
//!
use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional environment variable into `$ty`, falling back to
/// `$default` when unset. A value that fails to parse is an error, never the
/// default.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read a required environment variable; empty values count as missing.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("{} must be set to a source descriptor", $var_name))?
    };
}

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Settings shared by all source readers.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    // ---
    /// Maximum number of records per batch.
    pub batch_size: usize,

    /// Per-request timeout of the HTTP reader, in seconds.
    pub http_timeout_secs: u64,

    /// Maximum number of API pages to fetch (safety limit).
    pub api_max_pages: u32,

    /// Custom S3-compatible endpoint, e.g. a local emulator.
    pub s3_endpoint: Option<String>,

    pub s3_region: String,
    pub s3_access_key_id: String,
    pub s3_secret_access_key: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            http_timeout_secs: 30,
            api_max_pages: 100,
            s3_endpoint: None,
            s3_region: "us-east-1".to_string(),
            // LocalStack accepts any credentials
            s3_access_key_id: "test".to_string(),
            s3_secret_access_key: "test".to_string(),
        }
    }
}

impl IngestConfig {
    /// Copy of this config with a different batch size.
    pub fn with_batch_size(&self, batch_size: usize) -> Self {
        Self {
            batch_size,
            ..self.clone()
        }
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Source descriptor summarized by the `/summary` routes.
    pub source: String,

    /// Port the HTTP service listens on.
    pub listen_port: u16,

    pub ingest: IngestConfig,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `SENSOR_SOURCE` – file path, `http(s)://` URL or `s3://bucket/key`
///
/// Optional:
/// - `BATCH_SIZE` – records per batch (default: 1000)
/// - `HTTP_TIMEOUT_SECS` – HTTP reader timeout (default: 30)
/// - `API_MAX_PAGES` – max API pages to fetch (default: 100)
/// - `S3_ENDPOINT_URL` – custom S3 endpoint (default: AWS)
/// - `AWS_REGION`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`
/// - `LISTEN_PORT` – HTTP port (default: 8080)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let source = require_env!("SENSOR_SOURCE");
    let defaults = IngestConfig::default();
    let batch_size = parse_env!("BATCH_SIZE", usize, defaults.batch_size);
    let http_timeout_secs = parse_env!("HTTP_TIMEOUT_SECS", u64, defaults.http_timeout_secs);
    let api_max_pages = parse_env!("API_MAX_PAGES", u32, defaults.api_max_pages);
    let listen_port = parse_env!("LISTEN_PORT", u16, 8080);

    if batch_size == 0 {
        return Err(anyhow!("Invalid BATCH_SIZE: must be greater than zero"));
    }

    let ingest = IngestConfig {
        batch_size,
        http_timeout_secs,
        api_max_pages,
        s3_endpoint: env::var("S3_ENDPOINT_URL").ok().filter(|v| !v.is_empty()),
        s3_region: env::var("AWS_REGION").unwrap_or(defaults.s3_region),
        s3_access_key_id: env::var("AWS_ACCESS_KEY_ID").unwrap_or(defaults.s3_access_key_id),
        s3_secret_access_key: env::var("AWS_SECRET_ACCESS_KEY")
            .unwrap_or(defaults.s3_secret_access_key),
    };

    Ok(Config {
        source,
        listen_port,
        ingest,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks credentials while showing all other values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  SENSOR_SOURCE         : {}", self.source);
        tracing::info!("  BATCH_SIZE            : {}", self.ingest.batch_size);
        tracing::info!("  HTTP_TIMEOUT_SECS     : {}", self.ingest.http_timeout_secs);
        tracing::info!("  API_MAX_PAGES         : {}", self.ingest.api_max_pages);
        tracing::info!(
            "  S3_ENDPOINT_URL       : {}",
            self.ingest.s3_endpoint.as_deref().unwrap_or("<aws default>")
        );
        tracing::info!("  AWS_REGION            : {}", self.ingest.s3_region);
        tracing::info!(
            "  AWS_ACCESS_KEY_ID     : {}",
            mask_secret(&self.ingest.s3_access_key_id)
        );
        tracing::info!("  AWS_SECRET_ACCESS_KEY : ****");
        tracing::info!("  LISTEN_PORT           : {}", self.listen_port);
    }
}

/// Keep the first four characters of a credential, mask the rest.
fn mask_secret(secret: &str) -> String {
    // ---
    let visible: String = secret.chars().take(4).collect();
    if visible.len() < secret.len() {
        format!("{visible}****")
    } else {
        "****".to_string()
    }
}
