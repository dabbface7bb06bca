use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::content::ContentCollection;

/// Kind of entity a resource represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Audio,
    Data,
    Document,
    Image,
    Video,
    Collection,
}

/// Lifecycle status of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    AwaitingContent,
    AwaitingProcessing,
    Processing,
    Normal,
    Deleted,
}

/// An uploadable document. Content items attach to it through uploads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    #[validate(length(max = 1000, message = "Title must be at most 1000 characters"))]
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default)]
    pub status: ResourceStatus,
    /// Marks the resource as a sequence container when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<bool>,
    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentCollection>,
    pub date_added: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_deleted: Option<DateTime<Utc>>,
}

impl Resource {
    /// Create a fresh resource awaiting content.
    pub fn new(resource_type: ResourceType, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            resource_type,
            status: ResourceStatus::AwaitingContent,
            sequence: None,
            content: None,
            date_added: now,
            date_modified: now,
            date_deleted: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.status == ResourceStatus::Deleted || self.date_deleted.is_some()
    }

    pub fn is_collection(&self) -> bool {
        self.resource_type == ResourceType::Collection
    }

    /// A resource is a sequence whenever the flag is present at all.
    pub fn is_sequence(&self) -> bool {
        self.sequence.is_some()
    }

    /// Collections and sequences may only hold relations, never content.
    pub fn can_hold_content(&self) -> bool {
        !self.is_collection() && !self.is_sequence()
    }

    /// Mutable access to the content collection, creating it when absent.
    pub fn content_mut(&mut self) -> &mut ContentCollection {
        self.content.get_or_insert_with(ContentCollection::default)
    }

    /// Replace any previous content with an empty collection.
    pub fn clear_content(&mut self) {
        self.content = Some(ContentCollection::default());
    }

    /// Number of attached files (0 when no collection exists).
    pub fn file_count(&self) -> usize {
        self.content.as_ref().map_or(0, |c| c.files.len())
    }

    pub fn touch(&mut self) {
        self.date_modified = Utc::now();
    }
}
