//! Repositories for the data access layer
//!
//! Each collaborator the upload pipeline consumes is a trait in `store`, with a
//! PostgreSQL repository for production and an in-memory implementation used by
//! tests and `DOCUMENT_STORE=memory` deployments.

pub mod memory;
pub mod resource;
pub mod store;
pub mod upload_token;

pub use memory::{MemoryResourceStore, MemoryTokenStore};
pub use resource::ResourceRepository;
pub use store::{ResourceStore, UploadTokenStore};
pub use upload_token::{generate_upload_token, hash_upload_token, UploadTokenRepository};
