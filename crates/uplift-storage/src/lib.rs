//! Uplift Storage Library
//!
//! This crate implements the upload-orchestration engine: an explicit
//! [`UploadStore`] owning named uploaders, a memoized S3 client cache, the two
//! delivery strategies and the post-upload dimension resolver.
//!
//! # Upload key format
//!
//! Every record key is `{owner}/{timestamp}-{filename}` where `timestamp` is a
//! 13-digit, zero-padded millisecond value from a store-wide monotonic clock.
//! Keys therefore never collide within a store and sort by submission order.
//! Key generation is centralized in the `keys` module.

#[cfg(feature = "storage-s3")]
pub mod client_cache;
mod dispatcher;
#[cfg(feature = "dimensions")]
pub mod dimensions;
pub mod error;
pub mod keys;
pub mod store;
pub mod strategy;
pub mod token;

// Re-export commonly used types
#[cfg(feature = "storage-s3")]
pub use client_cache::{RemoteClient, RemoteClientCache};
#[cfg(feature = "dimensions")]
pub use dimensions::{DimensionError, DimensionResolver};
pub use error::{TransferError, UploadError, UploadResult};
pub use store::{UploadEvent, UploadStore, UploadStoreBuilder, Uploader};
pub use strategy::UploadStrategy;
pub use token::{StaticToken, TokenSource};
pub use uplift_core::{
    Dimensions, DispatchSettings, FileUploadRecord, LocalFile, StorageConfiguration,
    StorageCredentials, UploadStatus,
};
