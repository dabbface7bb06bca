//! Tessera Storage Library
//!
//! Blob storage for uploaded resource content, with S3 and local filesystem backends
//! behind the `Storage` trait.
//!
//! # Storage key format
//!
//! Keys are resource-scoped: `resources/{resource_id}/{filename}`. Keys must not
//! contain `..` or a leading `/`. Key generation lives in the `keys` module so all
//! backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use tessera_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};
