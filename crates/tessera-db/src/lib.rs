//! Tessera persistence
//!
//! Document store and upload token store, backed by PostgreSQL or held in memory.

pub mod db;

pub use db::*;
