use uplift_core::LocalFile;

use super::DispatchContext;
use crate::error::TransferError;

/// Join a key onto a public URL base with exactly one `/` between them.
pub fn join_public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

/// Direct-to-bucket upload with the store's credentials.
///
/// Objects are always stored with a public-read ACL so the unsigned object
/// URL is retrievable.
#[derive(Debug, Clone)]
pub struct CredentialedStrategy {
    bucket: String,
    region: String,
    public_url_base: Option<String>,
}

impl CredentialedStrategy {
    pub fn new(bucket: String, region: String, public_url_base: Option<String>) -> Self {
        Self {
            bucket,
            region,
            public_url_base: public_url_base.filter(|base| !base.trim().is_empty()),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    #[cfg(feature = "storage-s3")]
    pub async fn upload(
        &self,
        key: &str,
        file: &LocalFile,
        context: &DispatchContext,
    ) -> Result<String, TransferError> {
        let client = context
            .client
            .as_ref()
            .ok_or_else(|| TransferError::S3("no storage credentials configured".to_string()))?;

        client
            .put_public_object(&self.bucket, key, &file.content_type, file.data.clone())
            .await?;

        match &self.public_url_base {
            Some(base) => Ok(join_public_url(base, key)),
            None => client.object_url(&self.bucket, key).await,
        }
    }

    #[cfg(not(feature = "storage-s3"))]
    pub async fn upload(
        &self,
        _key: &str,
        _file: &LocalFile,
        _context: &DispatchContext,
    ) -> Result<String, TransferError> {
        Err(TransferError::S3(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_public_url() {
        assert_eq!(
            join_public_url("https://cdn.example/", "owner/1-photo.png"),
            "https://cdn.example/owner/1-photo.png"
        );
        assert_eq!(
            join_public_url("https://cdn.example/media", "/owner/1-photo.png"),
            "https://cdn.example/media/owner/1-photo.png"
        );
    }

    #[test]
    fn test_blank_public_url_base_ignored() {
        let strategy = CredentialedStrategy::new(
            "att".to_string(),
            "us-east-1".to_string(),
            Some("  ".to_string()),
        );
        assert!(strategy.public_url_base.is_none());
    }

    #[cfg(feature = "storage-s3")]
    #[tokio::test]
    async fn test_missing_client_is_an_s3_failure() {
        let strategy = CredentialedStrategy::new("att".to_string(), "us-east-1".to_string(), None);
        let file = LocalFile::new("photo.png", "image/png", vec![1u8, 2, 3]);

        let err = strategy
            .upload("owner/1-photo.png", &file, &DispatchContext::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "S3 upload failed: no storage credentials configured"
        );
    }
}
