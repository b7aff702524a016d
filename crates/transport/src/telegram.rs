//! Telegram transport: HTTP long-polling against `getUpdates`
//! (spec.md §6.2), grounded on the teacher's Telegram bot loop.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use vigil_core::Message;

use crate::trait_def::Transport;

const MAX_OUTBOUND_CHARS: usize = 3500;

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    chat: TelegramChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct OffsetFile {
    offset: i64,
}

pub struct TelegramTransport {
    client: Client,
    base_url: String,
    offset: i64,
    offset_path: PathBuf,
    allow_list: Option<Vec<String>>,
}

impl TelegramTransport {
    pub fn new(token: impl AsRef<str>, offset_path: impl AsRef<Path>, allow_list: Option<Vec<String>>) -> Self {
        let offset_path = offset_path.as_ref().to_path_buf();
        let offset = std::fs::read_to_string(&offset_path)
            .ok()
            .and_then(|raw| serde_json::from_str::<OffsetFile>(&raw).ok())
            .map(|f| f.offset)
            .unwrap_or(0);
        Self {
            client: Client::new(),
            base_url: format!("https://api.telegram.org/bot{}", token.as_ref()),
            offset,
            offset_path,
            allow_list,
        }
    }

    fn persist_offset(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.offset_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.offset_path, serde_json::to_string(&OffsetFile { offset: self.offset })?)?;
        Ok(())
    }

    fn allowed(&self, sender: &str) -> bool {
        match &self.allow_list {
            None => true,
            Some(ids) => ids.iter().any(|id| id == sender),
        }
    }
}

/// Strip HTML-like tags and truncate at a Unicode-safe boundary.
pub fn sanitize_outbound(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }
    if stripped.chars().count() <= MAX_OUTBOUND_CHARS {
        stripped
    } else {
        stripped.chars().take(MAX_OUTBOUND_CHARS).collect()
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn poll(&mut self) -> anyhow::Result<Vec<Message>> {
        let response = self
            .client
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[("timeout", "0"), ("offset", &self.offset.to_string())])
            .send()
            .await?
            .error_for_status()?;

        let payload: TelegramResponse<Vec<TelegramUpdate>> = response.json().await?;
        if !payload.ok {
            anyhow::bail!("telegram getUpdates failed");
        }

        let mut messages = Vec::new();
        for update in payload.result.unwrap_or_default() {
            self.offset = update.update_id + 1;
            let Some(msg) = update.message else { continue };
            let Some(text) = msg.text else { continue };
            let sender = msg.chat.id.to_string();
            if !self.allowed(&sender) {
                continue;
            }
            messages.push(Message::new(sender, text, Utc::now()));
        }
        self.persist_offset()?;
        Ok(messages)
    }

    async fn send(&mut self, recipient: &str, text: &str) -> anyhow::Result<bool> {
        let chat_id: i64 = recipient.parse()?;
        let sanitized = sanitize_outbound(text);
        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&SendMessageRequest { chat_id, text: &sanitized })
            .send()
            .await?
            .error_for_status()?;
        let payload: TelegramResponse<serde_json::Value> = response.json().await?;
        Ok(payload.ok)
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.persist_offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_html_tags() {
        assert_eq!(sanitize_outbound("<b>hello</b> world"), "hello world");
    }

    #[test]
    fn sanitize_truncates_past_max_chars() {
        let long = "a".repeat(MAX_OUTBOUND_CHARS + 50);
        let sanitized = sanitize_outbound(&long);
        assert_eq!(sanitized.chars().count(), MAX_OUTBOUND_CHARS);
    }
}
