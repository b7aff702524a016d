//! Console transport: inbound and outbound messages exchanged as lines
//! in two JSON files (spec.md §6.2).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_core::Message;

use crate::trait_def::Transport;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InboundEntry {
    sender: String,
    content: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OutboundEntry {
    recipient: String,
    text: String,
    timestamp: DateTime<Utc>,
}

pub struct ConsoleTransport {
    inbound_path: PathBuf,
    outbound_path: PathBuf,
    watermark: DateTime<Utc>,
}

impl ConsoleTransport {
    pub fn new(inbound_path: impl AsRef<Path>, outbound_path: impl AsRef<Path>) -> Self {
        Self {
            inbound_path: inbound_path.as_ref().to_path_buf(),
            outbound_path: outbound_path.as_ref().to_path_buf(),
            watermark: DateTime::<Utc>::MIN_UTC,
        }
    }

    fn read_entries(path: &Path) -> anyhow::Result<Vec<InboundEntry>> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Ok(serde_json::from_str(&raw).unwrap_or_default()),
            Err(_) => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn poll(&mut self) -> anyhow::Result<Vec<Message>> {
        let entries = Self::read_entries(&self.inbound_path)?;
        let mut fresh: Vec<InboundEntry> = entries.into_iter().filter(|e| e.timestamp > self.watermark).collect();
        fresh.sort_by_key(|e| e.timestamp);
        if let Some(last) = fresh.last() {
            self.watermark = last.timestamp;
        }
        Ok(fresh
            .into_iter()
            .map(|e| Message::new(e.sender, e.content, e.timestamp))
            .collect())
    }

    async fn send(&mut self, recipient: &str, text: &str) -> anyhow::Result<bool> {
        let mut entries: Vec<OutboundEntry> = match std::fs::read_to_string(&self.outbound_path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        entries.push(OutboundEntry {
            recipient: recipient.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
        });
        if let Some(parent) = self.outbound_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.outbound_path, serde_json::to_string_pretty(&entries)?)?;
        Ok(true)
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_inbound(path: &Path, entries: &[InboundEntry]) {
        std::fs::write(path, serde_json::to_string_pretty(entries).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn poll_returns_only_entries_past_the_watermark() {
        let dir = tempfile::tempdir().unwrap();
        let inbound = dir.path().join("inbound.json");
        let outbound = dir.path().join("outbound.json");

        let t1 = Utc::now();
        let t2 = t1 + chrono::Duration::seconds(1);
        write_inbound(
            &inbound,
            &[InboundEntry { sender: "a".to_string(), content: "hello".to_string(), timestamp: t1 }],
        );

        let mut transport = ConsoleTransport::new(&inbound, &outbound);
        let first = transport.poll().await.unwrap();
        assert_eq!(first.len(), 1);

        write_inbound(
            &inbound,
            &[
                InboundEntry { sender: "a".to_string(), content: "hello".to_string(), timestamp: t1 },
                InboundEntry { sender: "a".to_string(), content: "again".to_string(), timestamp: t2 },
            ],
        );
        let second = transport.poll().await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].content, "again");
    }

    #[tokio::test]
    async fn send_appends_to_outbound_file() {
        let dir = tempfile::tempdir().unwrap();
        let inbound = dir.path().join("inbound.json");
        let outbound = dir.path().join("outbound.json");
        let mut transport = ConsoleTransport::new(&inbound, &outbound);
        assert!(transport.send("a", "hi").await.unwrap());
        let raw = std::fs::read_to_string(&outbound).unwrap();
        let entries: Vec<OutboundEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "hi");
    }
}
