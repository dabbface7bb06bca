//! Stores, pipeline, and application state wiring

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tessera_core::{
    BroadcastEventPublisher, Config, DocumentStoreBackend, FanoutEventPublisher,
    TracingEventPublisher,
};
use tessera_db::{
    MemoryResourceStore, MemoryTokenStore, ResourceRepository, ResourceStore,
    UploadTokenRepository, UploadTokenStore,
};
use tessera_pipeline::{
    AttributeValidatorRegistry, HandlerChain, ResolverChain, SchemaValidator, UploadLocks,
    UploadOrchestrator, UriCheckOptions,
};
use tessera_storage::Storage;

use crate::state::AppState;

const EVENT_CHANNEL_CAPACITY: usize = 1024;
const TOKEN_CLEANUP_INTERVAL_SECS: u64 = 300;

/// Document and token stores selected by `DOCUMENT_STORE`.
#[derive(Clone)]
pub struct Stores {
    pub resources: Arc<dyn ResourceStore>,
    pub tokens: Arc<dyn UploadTokenStore>,
}

impl Stores {
    pub fn memory() -> Self {
        Self {
            resources: Arc::new(MemoryResourceStore::new()),
            tokens: Arc::new(MemoryTokenStore::new()),
        }
    }
}

pub async fn setup_stores(config: &Config) -> Result<Stores> {
    match config.document_store() {
        DocumentStoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; resources and tokens are not durable");
            Ok(Stores::memory())
        }
        DocumentStoreBackend::Postgres => {
            let pool = super::database::setup_database(config).await?;
            let tokens = UploadTokenRepository::new(pool.clone());
            spawn_token_cleanup(tokens.clone());

            Ok(Stores {
                resources: Arc::new(ResourceRepository::new(pool)),
                tokens: Arc::new(tokens),
            })
        }
    }
}

fn spawn_token_cleanup(tokens: UploadTokenRepository) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(TOKEN_CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            match tokens.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Expired upload tokens removed"),
                Err(e) => tracing::warn!(error = %e, "Upload token cleanup failed"),
            }
        }
    });
    tracing::info!(
        interval_secs = TOKEN_CLEANUP_INTERVAL_SECS,
        "Upload token cleanup scheduled"
    );
}

/// Build the upload pipeline and the shared application state.
pub fn initialize_services(
    config: &Config,
    stores: Stores,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let events = BroadcastEventPublisher::new(EVENT_CHANNEL_CAPACITY);
    let publisher = FanoutEventPublisher::new()
        .with(Arc::new(TracingEventPublisher))
        .with(Arc::new(events.clone()));

    let uri_options = UriCheckOptions::from_config(config);
    if !uri_options.check_enabled {
        tracing::warn!("URI availability checks are disabled");
    }

    let handlers = HandlerChain::standard(
        storage.clone(),
        uri_options,
        AttributeValidatorRegistry::default(),
    )?;

    let orchestrator = UploadOrchestrator::new(
        stores.resources.clone(),
        stores.tokens.clone(),
        storage.clone(),
        Arc::new(publisher),
        Arc::new(SchemaValidator),
        ResolverChain::default(),
        handlers,
        UploadLocks::new(),
        config.upload_lock_timeout(),
    );

    tracing::info!(
        lock_timeout_ms = config.upload_lock_timeout().as_millis() as u64,
        "Upload pipeline initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        resources: stores.resources,
        tokens: stores.tokens,
        storage,
        orchestrator: Arc::new(orchestrator),
        events,
    }))
}
