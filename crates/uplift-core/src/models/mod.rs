//! Domain models for upload orchestration

pub mod configuration;
pub mod credentials;
pub mod file;
pub mod record;

pub use configuration::StorageConfiguration;
pub use credentials::StorageCredentials;
pub use file::{FileSource, LocalFile};
pub use record::{Dimensions, FileUploadRecord, TransitionError, UploadStatus};
