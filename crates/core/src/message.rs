use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque sender identity. Transports mint these; the core never inspects
/// their structure beyond equality.
pub type OpaqueId = String;

/// An inbound message. Immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub sender: OpaqueId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

impl Message {
    pub fn new(sender: impl Into<String>, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            timestamp,
            metadata: None,
        }
    }
}

/// A response produced by the pipeline. Stored in both the interaction
/// collection and the conversation queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub in_response_to: Message,
    pub timestamp: DateTime<Utc>,
}
