//! Memoized S3 client for the direct-credentialed strategy
//!
//! The cache keeps a single client for the most recent credential set.
//! Asking for a different set builds a new client and drops the old one;
//! dispatches still holding the old `Arc` finish on it undisturbed.

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region, RequestChecksumCalculation};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use uplift_core::StorageCredentials;

use crate::error::TransferError;

const CREDENTIALS_PROVIDER_NAME: &str = "uplift-static";
const OBJECT_URL_PRESIGN_SECS: u64 = 3600;

/// Prepend `https://` to an endpoint that has no scheme.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    }
}

/// S3 client bound to one credential set and region
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: Client,
    region: String,
    endpoint_url: Option<String>,
}

impl RemoteClient {
    /// Build a client without touching the network.
    ///
    /// Path-style addressing is forced so S3-compatible providers that do not
    /// support virtual-hosted buckets work too.
    pub fn new(credentials: &StorageCredentials, region: &str) -> Self {
        let endpoint_url = credentials.endpoint.as_deref().map(normalize_endpoint);

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            ))
            .force_path_style(true)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired);

        if let Some(ref endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint.clone());
        }

        RemoteClient {
            client: Client::from_conf(builder.build()),
            region: region.to_string(),
            endpoint_url,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    /// Store an object readable by anyone.
    pub async fn put_public_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<(), TransferError> {
        let size = body.len() as i64;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .content_length(size)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| TransferError::S3(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    /// Canonical unsigned URL of an object.
    ///
    /// Signs a GET for the key locally and strips the query string; the
    /// result is valid for objects stored with a public-read ACL.
    pub async fn object_url(&self, bucket: &str, key: &str) -> Result<String, TransferError> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(OBJECT_URL_PRESIGN_SECS))
            .map_err(|e| TransferError::S3(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| TransferError::S3(DisplayErrorContext(&e).to_string()))?;

        Ok(strip_query(presigned.uri()).to_string())
    }
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}

struct CachedClient {
    credentials: StorageCredentials,
    region: String,
    client: Arc<RemoteClient>,
}

/// Single-slot cache of [`RemoteClient`]s keyed by credentials and region.
#[derive(Default)]
pub struct RemoteClientCache {
    slot: Mutex<Option<CachedClient>>,
    constructions: AtomicUsize,
}

impl RemoteClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoized client for this credential set, building it if
    /// the cached one belongs to another set.
    pub fn acquire(&self, credentials: &StorageCredentials, region: &str) -> Arc<RemoteClient> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = slot.as_ref() {
            if cached.credentials == *credentials && cached.region == region {
                tracing::debug!(region = %region, "Reusing cached S3 client");
                return Arc::clone(&cached.client);
            }
        }

        let client = Arc::new(RemoteClient::new(credentials, region));
        self.constructions.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            region = %region,
            endpoint = ?client.endpoint_url(),
            replaced = slot.is_some(),
            "Constructed S3 client"
        );

        *slot = Some(CachedClient {
            credentials: credentials.clone(),
            region: region.to_string(),
            client: Arc::clone(&client),
        });

        client
    }

    /// Number of clients built over the cache's lifetime.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::Relaxed)
    }
}
