//! Application state shared by all handlers.

use std::sync::Arc;

use tessera_core::{BroadcastEventPublisher, Config};
use tessera_db::{ResourceStore, UploadTokenStore};
use tessera_pipeline::UploadOrchestrator;
use tessera_storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub resources: Arc<dyn ResourceStore>,
    pub tokens: Arc<dyn UploadTokenStore>,
    pub storage: Arc<dyn Storage>,
    pub orchestrator: Arc<UploadOrchestrator>,
    /// In-process resource events; workers call `subscribe()`.
    pub events: BroadcastEventPublisher,
}
