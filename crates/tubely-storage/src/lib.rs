//! Tubely Storage Library
//!
//! Object storage for uploaded media. The `Storage` trait is the only thing the
//! upload pipeline sees; S3 (via `object_store`) and the local filesystem implement it.
//!
//! # Storage key format
//!
//! Video keys are `{aspect}/{id}.{ext}` where `aspect` is `landscape`, `portrait`
//! or `other` and `id` is 32 random bytes in URL-safe base64. Keys must not
//! contain `..` or a leading `/`. Key generation lives in the `keys` module.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{asset_file_name, random_id, video_storage_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
