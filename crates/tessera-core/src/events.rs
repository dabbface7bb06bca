//! Resource event hooks
//!
//! The upload pipeline announces content changes through these publish-only
//! interfaces so that other subsystems (transcoding workers, search indexers,
//! caches) can react without the pipeline depending on them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Resource, ResourceStatus};

/// Event emitted by the upload pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    /// Existing content is about to be discarded in favour of new content.
    ContentRemovalPending {
        resource_id: Uuid,
        file_count: usize,
    },
    /// The resource document was persisted with new content.
    ResourceModified {
        resource_id: Uuid,
        status: ResourceStatus,
        file_count: usize,
    },
}

impl ResourceEvent {
    pub fn content_removal_pending(resource: &Resource) -> Self {
        ResourceEvent::ContentRemovalPending {
            resource_id: resource.id,
            file_count: resource.file_count(),
        }
    }

    pub fn resource_modified(resource: &Resource) -> Self {
        ResourceEvent::ResourceModified {
            resource_id: resource.id,
            status: resource.status,
            file_count: resource.file_count(),
        }
    }

    pub fn resource_id(&self) -> Uuid {
        match self {
            ResourceEvent::ContentRemovalPending { resource_id, .. }
            | ResourceEvent::ResourceModified { resource_id, .. } => *resource_id,
        }
    }
}

/// Publish-only notification bus.
#[async_trait]
pub trait ResourceEventPublisher: Send + Sync {
    async fn publish(&self, event: ResourceEvent) -> anyhow::Result<()>;

    /// Announce that the resource's current content is about to be cleared.
    async fn content_removal_pending(&self, resource: &Resource) -> anyhow::Result<()> {
        self.publish(ResourceEvent::content_removal_pending(resource))
            .await
    }

    /// Announce that the resource was persisted with new content.
    async fn resource_modified(&self, resource: &Resource) -> anyhow::Result<()> {
        self.publish(ResourceEvent::resource_modified(resource)).await
    }
}

/// Writes every event to the log and nothing else.
#[derive(Debug, Default, Clone)]
pub struct TracingEventPublisher;

#[async_trait]
impl ResourceEventPublisher for TracingEventPublisher {
    async fn publish(&self, event: ResourceEvent) -> anyhow::Result<()> {
        match &event {
            ResourceEvent::ContentRemovalPending {
                resource_id,
                file_count,
            } => {
                tracing::info!(resource_id = %resource_id, file_count, "Resource content removal pending");
            }
            ResourceEvent::ResourceModified {
                resource_id,
                status,
                file_count,
            } => {
                tracing::info!(resource_id = %resource_id, status = ?status, file_count, "Resource modified");
            }
        }
        Ok(())
    }
}

/// In-process event channel. Subscribers that lag behind lose the oldest events.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<ResourceEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl ResourceEventPublisher for BroadcastEventPublisher {
    async fn publish(&self, event: ResourceEvent) -> anyhow::Result<()> {
        // No subscribers is not an error.
        let _ = self.sender.send(event);
        Ok(())
    }
}

/// Publishes to every inner publisher in order, stopping at the first failure.
#[derive(Clone, Default)]
pub struct FanoutEventPublisher {
    publishers: Vec<Arc<dyn ResourceEventPublisher>>,
}

impl FanoutEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, publisher: Arc<dyn ResourceEventPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }
}

#[async_trait]
impl ResourceEventPublisher for FanoutEventPublisher {
    async fn publish(&self, event: ResourceEvent) -> anyhow::Result<()> {
        for publisher in &self.publishers {
            publisher.publish(event.clone()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceType;

    #[tokio::test]
    async fn test_broadcast_delivers_to_subscribers() {
        let publisher = BroadcastEventPublisher::new(8);
        let mut rx = publisher.subscribe();
        let resource = Resource::new(ResourceType::Video, "clip");

        publisher
            .publish(ResourceEvent::resource_modified(&resource))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.resource_id(), resource.id);
        assert!(matches!(event, ResourceEvent::ResourceModified { .. }));
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_ok() {
        let publisher = BroadcastEventPublisher::new(8);
        let resource = Resource::new(ResourceType::Audio, "a");
        assert!(publisher.content_removal_pending(&resource).await.is_ok());
    }

    #[tokio::test]
    async fn test_fanout_reaches_all() {
        let first = BroadcastEventPublisher::new(4);
        let second = BroadcastEventPublisher::new(4);
        let mut rx1 = first.subscribe();
        let mut rx2 = second.subscribe();
        let fanout = FanoutEventPublisher::new()
            .with(Arc::new(TracingEventPublisher))
            .with(Arc::new(first))
            .with(Arc::new(second));

        let resource = Resource::new(ResourceType::Image, "i");
        fanout.resource_modified(&resource).await.unwrap();

        assert_eq!(rx1.recv().await.unwrap().resource_id(), resource.id);
        assert_eq!(rx2.recv().await.unwrap().resource_id(), resource.id);
    }
}
