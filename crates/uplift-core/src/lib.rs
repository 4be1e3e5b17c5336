//! Uplift Core Library
//!
//! This crate provides the domain models, state machine and configuration
//! shared by the upload engine and its command-line front end.

pub mod config;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{DispatchSettings, UploadConfig};
pub use models::{
    Dimensions, FileSource, FileUploadRecord, LocalFile, StorageConfiguration,
    StorageCredentials, TransitionError, UploadStatus,
};
pub use storage_types::StorageService;
