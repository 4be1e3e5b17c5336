use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Credential set for direct-to-bucket delivery.
///
/// Equality covers every field: the remote client cache treats any change as a
/// new credential set and rebuilds its client.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint for S3-compatible providers (MinIO, R2, Spaces, ...)
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl StorageCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        endpoint: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            endpoint,
        }
    }

    /// Both halves of the key pair are present.
    pub fn is_complete(&self) -> bool {
        !self.access_key_id.trim().is_empty() && !self.secret_access_key.trim().is_empty()
    }
}

impl Debug for StorageCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StorageCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
