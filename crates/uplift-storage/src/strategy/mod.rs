//! Delivery strategies
//!
//! An uploader picks exactly one strategy from its configuration when it is
//! created; files are never re-checked against the configuration afterwards.

mod presigned;
mod s3;

pub use presigned::PresignedUrlStrategy;
pub use s3::{join_public_url, CredentialedStrategy};

use std::sync::Arc;
use uplift_core::{LocalFile, StorageConfiguration, StorageService};

#[cfg(feature = "storage-s3")]
use crate::client_cache::RemoteClient;
use crate::error::TransferError;
use crate::token::TokenSource;

/// Resources the store resolves once per batch before dispatching.
#[derive(Clone, Default)]
pub struct DispatchContext {
    /// Client for the credentials captured at submission time
    #[cfg(feature = "storage-s3")]
    pub client: Option<Arc<RemoteClient>>,
}

/// One of the two supported delivery protocols
#[derive(Debug)]
pub enum UploadStrategy {
    PresignedUrl(PresignedUrlStrategy),
    Credentialed(CredentialedStrategy),
}

impl UploadStrategy {
    pub fn from_configuration(
        configuration: &StorageConfiguration,
        http: reqwest::Client,
        token_source: Option<Arc<dyn TokenSource>>,
    ) -> Self {
        match configuration {
            StorageConfiguration::PresignedUrl { proxy_base_url } => UploadStrategy::PresignedUrl(
                PresignedUrlStrategy::new(http, proxy_base_url.clone(), token_source),
            ),
            StorageConfiguration::Credentials {
                bucket,
                region,
                public_url_base,
            } => UploadStrategy::Credentialed(CredentialedStrategy::new(
                bucket.clone(),
                region.clone(),
                public_url_base.clone(),
            )),
        }
    }

    pub fn service(&self) -> StorageService {
        match self {
            UploadStrategy::PresignedUrl(_) => StorageService::PresignedUrl,
            UploadStrategy::Credentialed(_) => StorageService::Credentials,
        }
    }

    /// Transfer one file and return its retrievable URL.
    pub async fn upload(
        &self,
        key: &str,
        file: &LocalFile,
        context: &DispatchContext,
    ) -> Result<String, TransferError> {
        match self {
            UploadStrategy::PresignedUrl(strategy) => strategy.upload(key, file).await,
            UploadStrategy::Credentialed(strategy) => strategy.upload(key, file, context).await,
        }
    }
}
