//! Signal transport: wraps `signal-cli`'s JSON-RPC receive output
//! (spec.md §6.2).

use std::process::Stdio;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tokio::process::Command;
use vigil_core::Message;

use crate::trait_def::Transport;

#[derive(Debug, Deserialize)]
struct Envelope {
    source: Option<String>,
    timestamp: Option<i64>,
    #[serde(rename = "dataMessage")]
    data_message: Option<DataMessage>,
}

#[derive(Debug, Deserialize)]
struct DataMessage {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignalLine {
    envelope: Envelope,
}

pub struct SignalTransport {
    cli_path: String,
    account: String,
    watermark_ms: i64,
}

impl SignalTransport {
    pub fn new(cli_path: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            cli_path: cli_path.into(),
            account: account.into(),
            watermark_ms: 0,
        }
    }

    fn parse_line(line: &str, watermark_ms: i64) -> Option<(Message, i64)> {
        let parsed: SignalLine = serde_json::from_str(line).ok()?;
        let timestamp_ms = parsed.envelope.timestamp?;
        if timestamp_ms <= watermark_ms {
            return None;
        }
        let text = parsed.envelope.data_message?.message?;
        let sender = parsed.envelope.source?;
        let timestamp = Utc.timestamp_millis_opt(timestamp_ms).single().unwrap_or_else(Utc::now);
        Some((Message::new(sender, text, timestamp), timestamp_ms))
    }
}

#[async_trait]
impl Transport for SignalTransport {
    async fn poll(&mut self) -> anyhow::Result<Vec<Message>> {
        let output = Command::new(&self.cli_path)
            .arg("-a")
            .arg(&self.account)
            .arg("receive")
            .arg("--json")
            .stdout(Stdio::piped())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut messages = Vec::new();
        let mut max_seen = self.watermark_ms;
        for line in stdout.lines() {
            if let Some((message, timestamp_ms)) = Self::parse_line(line, self.watermark_ms) {
                max_seen = max_seen.max(timestamp_ms);
                messages.push(message);
            }
        }
        self.watermark_ms = max_seen;
        messages.sort_by_key(|m: &Message| m.timestamp);
        Ok(messages)
    }

    async fn send(&mut self, recipient: &str, text: &str) -> anyhow::Result<bool> {
        let status = Command::new(&self.cli_path)
            .arg("-a")
            .arg(&self.account)
            .arg("send")
            .arg("-m")
            .arg(text)
            .arg(recipient)
            .status()
            .await?;
        Ok(status.success())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_skips_entries_without_data_message() {
        let line = r#"{"envelope":{"source":"+1555","timestamp":1000}}"#;
        assert!(SignalTransport::parse_line(line, 0).is_none());
    }

    #[test]
    fn parse_line_skips_entries_at_or_before_watermark() {
        let line = r#"{"envelope":{"source":"+1555","timestamp":1000,"dataMessage":{"message":"hi"}}}"#;
        assert!(SignalTransport::parse_line(line, 1000).is_none());
        assert!(SignalTransport::parse_line(line, 999).is_some());
    }

    #[test]
    fn parse_line_extracts_message_past_watermark() {
        let line = r#"{"envelope":{"source":"+1555","timestamp":2000,"dataMessage":{"message":"hello"}}}"#;
        let (message, ts) = SignalTransport::parse_line(line, 1000).unwrap();
        assert_eq!(message.content, "hello");
        assert_eq!(message.sender, "+1555");
        assert_eq!(ts, 2000);
    }
}
