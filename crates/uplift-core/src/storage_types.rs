use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Delivery strategy types
///
/// This enum names the two supported delivery strategies without their
/// strategy-specific fields. It's used for configuration parsing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageService {
    PresignedUrl,
    Credentials,
}

impl FromStr for StorageService {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "presigned-url" | "presigned_url" => Ok(StorageService::PresignedUrl),
            "credentials" => Ok(StorageService::Credentials),
            _ => Err(anyhow::anyhow!("Invalid storage service: {}", s)),
        }
    }
}

impl Display for StorageService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageService::PresignedUrl => write!(f, "presigned-url"),
            StorageService::Credentials => write!(f, "credentials"),
        }
    }
}
