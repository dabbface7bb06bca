//! Domain models for resources and their content.

pub mod content;
pub mod resource;

pub use content::{ContentCollection, FileDescriptor};
pub use resource::{Resource, ResourceStatus, ResourceType};
