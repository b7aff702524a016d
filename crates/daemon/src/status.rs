//! The status file written on startup and on graceful/fatal shutdown
//! (spec.md §6.6: `{status, start_time|stop_time|error_time, pid, platform?}`).

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Starting,
    Running,
    Stopped,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusFile {
    pub status: StatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_time: Option<DateTime<Utc>>,
    pub pid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl StatusFile {
    pub fn write(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn read(path: impl AsRef<Path>) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.status");
        let status = StatusFile {
            status: StatusKind::Running,
            start_time: Some(Utc::now()),
            stop_time: None,
            error_time: None,
            pid: 1234,
            platform: Some("console".to_string()),
        };
        status.write(&path).unwrap();
        let loaded = StatusFile::read(&path).unwrap();
        assert_eq!(loaded.pid, 1234);
        assert!(matches!(loaded.status, StatusKind::Running));
    }
}
