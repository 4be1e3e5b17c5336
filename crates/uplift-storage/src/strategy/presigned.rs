use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use uplift_core::LocalFile;

use crate::error::TransferError;
use crate::keys::encode_key_path;
use crate::token::TokenSource;

/// Proxy-mediated upload.
///
/// 1. `PUT {proxy}/{key}` with the raw body; the proxy redirects to a
///    time-limited signed URL and the HTTP client follows it.
/// 2. `GET {proxy}/{key}` returns the durable public URL as a JSON string.
pub struct PresignedUrlStrategy {
    http: reqwest::Client,
    proxy_base_url: String,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl Debug for PresignedUrlStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PresignedUrlStrategy")
            .field("proxy_base_url", &self.proxy_base_url)
            .field("token_source", &self.token_source.is_some())
            .finish()
    }
}

impl PresignedUrlStrategy {
    pub fn new(
        http: reqwest::Client,
        proxy_base_url: String,
        token_source: Option<Arc<dyn TokenSource>>,
    ) -> Self {
        Self {
            http,
            proxy_base_url,
            token_source,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.proxy_base_url.trim_end_matches('/'),
            encode_key_path(key)
        )
    }

    pub async fn upload(&self, key: &str, file: &LocalFile) -> Result<String, TransferError> {
        let object_url = self.object_url(key);

        let put_url = match &self.token_source {
            Some(source) => {
                let token = source
                    .token()
                    .await
                    .map_err(|e| TransferError::Proxy(format!("token fetch failed: {}", e)))?;
                format!("{}?token={}", object_url, urlencoding::encode(&token))
            }
            None => object_url.clone(),
        };

        let response = self
            .http
            .put(&put_url)
            .header(CONTENT_TYPE, file.content_type.as_str())
            .body(file.data.clone())
            .send()
            .await
            .map_err(|e| TransferError::Proxy(e.to_string()))?;
        ensure_ok(response).await?;

        let response = self
            .http
            .get(&object_url)
            .send()
            .await
            .map_err(|e| TransferError::Proxy(e.to_string()))?;
        let response = ensure_ok(response).await?;

        let url: String = response
            .json()
            .await
            .map_err(|e| TransferError::Proxy(format!("invalid URL response: {}", e)))?;

        if url.trim().is_empty() {
            return Err(TransferError::Proxy("proxy returned an empty URL".to_string()));
        }

        Ok(url)
    }
}

/// Anything but a terminal 200 is a failure carrying the response body.
async fn ensure_ok(response: Response) -> Result<Response, TransferError> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        format!("Upload failed with status {}", status.as_u16())
    } else {
        body.trim().to_string()
    };
    Err(TransferError::Proxy(message))
}
