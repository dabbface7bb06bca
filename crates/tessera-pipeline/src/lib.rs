//! Tessera upload pipeline
//!
//! Turns an incoming upload into a content change on a resource:
//! token gate → resolver chain → (optional content wipe) → handler chain →
//! validation → persistence. The [`UploadOrchestrator`] drives the flow; resolvers,
//! handlers, and attribute validators are pluggable.

pub mod attributes;
pub mod content;
pub mod handler;
pub mod lock;
pub mod orchestrator;
pub mod request;
pub mod resolver;
pub mod ssrf;
pub mod token_gate;
pub mod validation;

pub use attributes::{AttributeValidator, AttributeValidatorRegistry};
pub use content::{ContentData, ResolvedContent, UriReference};
pub use handler::{ContentHandler, HandleOutcome, HandlerChain, UriCheckOptions};
pub use lock::{UploadLockGuard, UploadLocks};
pub use orchestrator::{UploadOrchestrator, UploadOutcome};
pub use request::{BodyRejection, UploadBody, UploadRequest, UploadedFile};
pub use resolver::{ResolveContext, ResolverChain, UploadResolver};
pub use token_gate::TokenGate;
pub use validation::{ResourceValidator, SchemaValidator};
