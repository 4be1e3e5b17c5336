use serde::{Deserialize, Serialize};

use crate::storage_types::StorageService;

pub const DEFAULT_REGION: &str = "us-east-1";

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Resolved delivery configuration for one uploader.
///
/// An uploader captures this value when it is created and never sees later
/// changes; pick up new settings by creating a new uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "service",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum StorageConfiguration {
    /// Upload through a trusted proxy that exchanges the request for a signed URL
    PresignedUrl { proxy_base_url: String },
    /// Upload straight to a bucket with the store's credentials
    Credentials {
        bucket: String,
        #[serde(default = "default_region")]
        region: String,
        #[serde(default)]
        public_url_base: Option<String>,
    },
}

impl StorageConfiguration {
    pub fn presigned_url(proxy_base_url: impl Into<String>) -> Self {
        StorageConfiguration::PresignedUrl {
            proxy_base_url: proxy_base_url.into(),
        }
    }

    pub fn credentials(bucket: impl Into<String>, public_url_base: Option<String>) -> Self {
        StorageConfiguration::Credentials {
            bucket: bucket.into(),
            region: default_region(),
            public_url_base,
        }
    }

    pub fn service(&self) -> StorageService {
        match self {
            StorageConfiguration::PresignedUrl { .. } => StorageService::PresignedUrl,
            StorageConfiguration::Credentials { .. } => StorageService::Credentials,
        }
    }
}
