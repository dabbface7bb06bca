//! Tessera Core Library
//!
//! This crate provides core domain models, error types, configuration, and the
//! event hooks shared across all Tessera components.

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use events::{
    BroadcastEventPublisher, FanoutEventPublisher, ResourceEvent, ResourceEventPublisher,
    TracingEventPublisher,
};
pub use storage_types::{DocumentStoreBackend, StorageBackend};
