//! File upload record and its status state machine
//!
//! A record only moves forward: `initial -> loading -> success | error`.
//! Both terminal states are final; a retry is a new record under a new key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::file::FileSource;

const DEFAULT_ERROR_MESSAGE: &str = "Upload failed";

/// Transfer status of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Initial,
    Loading,
    Success,
    Error,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Error)
    }

    pub fn can_transition_to(self, next: UploadStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (UploadStatus::Initial, UploadStatus::Loading)
                | (UploadStatus::Loading, UploadStatus::Success)
                | (UploadStatus::Loading, UploadStatus::Error)
        )
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Initial => write!(f, "initial"),
            UploadStatus::Loading => write!(f, "loading"),
            UploadStatus::Success => write!(f, "success"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

/// Rejected record mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Invalid status transition for {key}: {from} -> {to}")]
    InvalidTransition {
        key: String,
        from: UploadStatus,
        to: UploadStatus,
    },

    #[error("Empty remote URL for {0}")]
    EmptyUrl(String),

    #[error("Dimensions can only be set on a successful upload: {0}")]
    NotSucceeded(String),
}

/// Pixel size of an uploaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Tracked state of one file transfer attempt.
///
/// Fields are private so every change goes through the transition methods;
/// `success` always carries a URL and `error` always carries a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadRecord {
    key: String,
    source: FileSource,
    status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FileUploadRecord {
    /// Seed a record in the `initial` state.
    pub fn new(key: impl Into<String>, source: FileSource) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            source,
            status: UploadStatus::Initial,
            remote_url: None,
            dimensions: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_image(&self) -> bool {
        self.source.is_image()
    }

    /// `initial -> loading`
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.advance(UploadStatus::Loading)
    }

    /// `loading -> success`
    pub fn succeed(&mut self, remote_url: impl Into<String>) -> Result<(), TransitionError> {
        let remote_url = remote_url.into();
        if remote_url.trim().is_empty() {
            return Err(TransitionError::EmptyUrl(self.key.clone()));
        }
        self.advance(UploadStatus::Success)?;
        self.remote_url = Some(remote_url);
        Ok(())
    }

    /// `loading -> error`; an empty message is replaced by a generic one.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        let message = message.into();
        self.advance(UploadStatus::Error)?;
        self.error_message = Some(if message.trim().is_empty() {
            DEFAULT_ERROR_MESSAGE.to_string()
        } else {
            message
        });
        Ok(())
    }

    pub fn set_dimensions(&mut self, dimensions: Dimensions) -> Result<(), TransitionError> {
        if self.status != UploadStatus::Success {
            return Err(TransitionError::NotSucceeded(self.key.clone()));
        }
        self.dimensions = Some(dimensions);
        self.updated_at = Utc::now();
        Ok(())
    }

    fn advance(&mut self, next: UploadStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError::InvalidTransition {
                key: self.key.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}
