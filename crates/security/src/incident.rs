//! Security incident record (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityIncident {
    pub user_id: Option<String>,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: IncidentType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentType {
    InputLength,
    SuspiciousPattern,
    ResponsePattern,
    RateLimiting,
}
