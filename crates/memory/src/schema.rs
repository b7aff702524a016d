//! Record shapes stored in the vector collections (spec.md §3, §4.3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two append-only collections memory maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Interactions,
    Reflections,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Interactions => "interactions",
            Collection::Reflections => "reflections",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    UserMessage,
    SystemResponse,
    SystemReflection,
}

/// Metadata attached to a stored document. Fields beyond `source`/`timestamp`/`kind`
/// are only populated for `system_response` records, per spec.md §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub source: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_timestamp: Option<DateTime<Utc>>,
}

/// A single stored document: id, text, metadata, embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub document: String,
    pub metadata: RecordMetadata,
    pub embedding: Vec<f32>,
}
