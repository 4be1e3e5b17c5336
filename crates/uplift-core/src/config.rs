//! Configuration module
//!
//! Resolves the delivery configuration, optional credentials and dispatch
//! tuning from environment variables (a `.env` file is honored).

use std::env;
use std::time::Duration;

use crate::models::configuration::DEFAULT_REGION;
use crate::models::{StorageConfiguration, StorageCredentials};
use crate::storage_types::StorageService;

// Common constants
const HTTP_TIMEOUT_SECS: u64 = 60;
const MAX_DIMENSION_FETCH_MB: u64 = 50;
const DEFAULT_OWNER_ID: &str = "anonymous";

/// Tuning for the dispatcher's HTTP traffic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Whole-request timeout applied by the HTTP client; the engine has no
    /// cancellation of its own.
    pub http_timeout: Duration,
    /// Largest image body the dimension resolver will download.
    pub max_dimension_fetch_bytes: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            max_dimension_fetch_bytes: MAX_DIMENSION_FETCH_MB * 1024 * 1024,
        }
    }
}

/// Upload configuration resolved from the environment
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub storage: StorageConfiguration,
    pub credentials: Option<StorageCredentials>,
    pub owner_id: String,
    /// Short-lived token appended to proxy PUT URLs, if the proxy wants one
    pub proxy_token: Option<String>,
    pub dispatch: DispatchSettings,
}

impl UploadConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| var(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let service = match non_empty("UPLOAD_STORAGE_SERVICE") {
            Some(value) => value.parse::<StorageService>()?,
            None => StorageService::PresignedUrl,
        };

        let storage = match service {
            StorageService::PresignedUrl => StorageConfiguration::PresignedUrl {
                proxy_base_url: non_empty("UPLOAD_PROXY_BASE_URL").ok_or_else(|| {
                    anyhow::anyhow!("UPLOAD_PROXY_BASE_URL must be set for the presigned-url service")
                })?,
            },
            StorageService::Credentials => StorageConfiguration::Credentials {
                bucket: non_empty("S3_BUCKET").ok_or_else(|| {
                    anyhow::anyhow!("S3_BUCKET must be set for the credentials service")
                })?,
                region: non_empty("S3_REGION")
                    .or_else(|| non_empty("AWS_REGION"))
                    .unwrap_or_else(|| DEFAULT_REGION.to_string()),
                public_url_base: non_empty("S3_PUBLIC_URL_BASE"),
            },
        };

        let credentials = match (
            non_empty("AWS_ACCESS_KEY_ID"),
            non_empty("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StorageCredentials {
                access_key_id,
                secret_access_key,
                endpoint: non_empty("S3_ENDPOINT"),
            }),
            (None, None) => None,
            _ => {
                return Err(anyhow::anyhow!(
                    "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must both be set"
                ))
            }
        };

        let http_timeout_secs = non_empty("UPLOAD_HTTP_TIMEOUT_SECS")
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("UPLOAD_HTTP_TIMEOUT_SECS must be a valid number"))
            })
            .transpose()?
            .unwrap_or(HTTP_TIMEOUT_SECS);

        let max_dimension_fetch_mb = non_empty("UPLOAD_MAX_DIMENSION_FETCH_MB")
            .map(|v| {
                v.parse::<u64>().map_err(|_| {
                    anyhow::anyhow!("UPLOAD_MAX_DIMENSION_FETCH_MB must be a valid number")
                })
            })
            .transpose()?
            .unwrap_or(MAX_DIMENSION_FETCH_MB);
        let max_dimension_fetch_bytes = max_dimension_fetch_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("UPLOAD_MAX_DIMENSION_FETCH_MB is too large"))?;

        Ok(UploadConfig {
            storage,
            credentials,
            owner_id: non_empty("UPLOAD_OWNER_ID").unwrap_or_else(|| DEFAULT_OWNER_ID.to_string()),
            proxy_token: non_empty("UPLOAD_PROXY_TOKEN"),
            dispatch: DispatchSettings {
                http_timeout: Duration::from_secs(http_timeout_secs),
                max_dimension_fetch_bytes,
            },
        })
    }
}
