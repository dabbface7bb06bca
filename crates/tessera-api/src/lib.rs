//! Tessera API Library
//!
//! HTTP surface for the upload pipeline: request extraction, error mapping,
//! routes, and application setup.

pub mod constants;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
