//! Short-lived token source for the presigned-url proxy
//!
//! The proxy may require a bearer token to accept an upload. It only ever
//! travels in the PUT URL's query string, never in a header.

use async_trait::async_trait;

#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Fetch a token for one upload.
    async fn token(&self) -> anyhow::Result<String>;
}

/// Token that never changes, e.g. one handed over through the environment.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}
