//! `MemoryManager` — the hybrid memory component (spec.md §4.3).

use chrono::{DateTime, Utc};
use tracing::debug;
use vigil_config::MemoryConfig;
use vigil_core::Message;

use crate::conversation_queue::ConversationQueue;
use crate::embed::{default_embed_fn, EmbedFn};
use crate::schema::{InteractionType, Record, RecordMetadata};
use crate::vector_store::{InMemoryCollection, VectorCollection};

/// Prefix marking a reflection when it's folded into retrieved context, so
/// downstream prompts can tell a recalled self-reflection from a recalled
/// interaction at a glance.
pub const REFLECTION_MARKER: &str = "[reflection]";

/// One of the `n` most recent user turns, paired with its system reply if
/// the link fields (spec.md §3 invariant) resolve to one.
#[derive(Debug, Clone)]
pub struct InteractionPair {
    pub sender: String,
    pub user_message: String,
    pub timestamp: DateTime<Utc>,
    pub response_text: String,
}

pub struct MemoryManager {
    interactions: InMemoryCollection,
    reflections: InMemoryCollection,
    recent_responses: ConversationQueue,
    embed: EmbedFn,
    max_semantic_results: usize,
}

impl MemoryManager {
    pub fn new(config: &MemoryConfig) -> anyhow::Result<Self> {
        Self::with_embed(config, default_embed_fn())
    }

    pub fn with_embed(config: &MemoryConfig, embed: EmbedFn) -> anyhow::Result<Self> {
        let data_dir = std::path::Path::new(&config.data_dir);
        let interactions = InMemoryCollection::load_or_create(data_dir.join("interactions.json"))?;
        let reflections = InMemoryCollection::load_or_create(data_dir.join("reflections.json"))?;
        Ok(Self {
            interactions,
            reflections,
            recent_responses: ConversationQueue::new(config.conversation_queue_len),
            embed,
            max_semantic_results: config.max_semantic_results,
        })
    }

    fn fresh_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn store_interaction(&mut self, msg: &Message) -> anyhow::Result<()> {
        let embedding = (self.embed)(&msg.content);
        self.interactions.add(
            Self::fresh_id(),
            embedding,
            msg.content.clone(),
            RecordMetadata {
                source: msg.sender.clone(),
                timestamp: msg.timestamp,
                kind: InteractionType::UserMessage,
                in_response_to: None,
                original_sender: None,
                original_timestamp: None,
            },
        );
        Ok(())
    }

    pub fn store_response(&mut self, text: &str, in_reply_to: &Message, now: DateTime<Utc>) -> anyhow::Result<()> {
        let embedding = (self.embed)(text);
        self.interactions.add(
            Self::fresh_id(),
            embedding,
            text.to_string(),
            RecordMetadata {
                source: "system".to_string(),
                timestamp: now,
                kind: InteractionType::SystemResponse,
                in_response_to: Some(in_reply_to.content.clone()),
                original_sender: Some(in_reply_to.sender.clone()),
                original_timestamp: Some(in_reply_to.timestamp),
            },
        );
        self.recent_responses.push(text);
        Ok(())
    }

    pub fn store_reflection(&mut self, text: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
        let embedding = (self.embed)(text);
        self.reflections.add(
            Self::fresh_id(),
            embedding,
            text.to_string(),
            RecordMetadata {
                source: "system".to_string(),
                timestamp: now,
                kind: InteractionType::SystemReflection,
                in_response_to: None,
                original_sender: None,
                original_timestamp: None,
            },
        );
        Ok(())
    }

    /// Top-n interactions plus top-2 reflections (marker-prefixed), most
    /// relevant first within each group.
    pub fn retrieve_relevant_context(&self, query: &str, n: usize) -> Vec<String> {
        let embedding = (self.embed)(query);
        let mut out: Vec<String> = self.interactions.query(&embedding, n).documents;
        let reflection_hits = self.reflections.query(&embedding, 2).documents;
        out.extend(reflection_hits.into_iter().map(|text| format!("{REFLECTION_MARKER} {text}")));
        out
    }

    /// The `n` most recent user messages paired with their matching system
    /// response, matched by strict equality of the three link fields.
    pub fn retrieve_last_interactions(&self, n: usize) -> Vec<InteractionPair> {
        let all = self.interactions.get();
        let responses: Vec<&Record> = all
            .iter()
            .filter(|r| r.metadata.kind == InteractionType::SystemResponse)
            .collect();

        let mut user_records: Vec<&Record> = all
            .iter()
            .filter(|r| r.metadata.kind == InteractionType::UserMessage)
            .collect();
        user_records.sort_by_key(|r| r.metadata.timestamp);
        let tail: Vec<&Record> = user_records
            .into_iter()
            .rev()
            .take(n)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        tail.into_iter()
            .map(|user| {
                let response_text = responses
                    .iter()
                    .find(|resp| {
                        resp.metadata.in_response_to.as_deref() == Some(user.document.as_str())
                            && resp.metadata.original_sender.as_deref() == Some(user.metadata.source.as_str())
                            && resp.metadata.original_timestamp == Some(user.metadata.timestamp)
                    })
                    .map(|resp| resp.document.clone())
                    .unwrap_or_default();
                InteractionPair {
                    sender: user.metadata.source.clone(),
                    user_message: user.document.clone(),
                    timestamp: user.metadata.timestamp,
                    response_text,
                }
            })
            .collect()
    }

    pub fn get_conversation_context(&self, n: usize) -> Vec<String> {
        self.recent_responses.trailing(n)
    }

    /// Combine semantic recall and the conversation buffer per
    /// `cfg.context_strategy` ∈ {semantic, conversation, hybrid}.
    pub fn get_hybrid_context(&self, query: &str, config: &MemoryConfig) -> String {
        let semantic_block = || -> Option<String> {
            let hits = self.retrieve_relevant_context(query, self.max_semantic_results.max(config.max_semantic_results));
            if hits.is_empty() {
                None
            } else {
                Some(hits.join("\n"))
            }
        };
        let conversation_block = || -> Option<String> {
            let trailing = self.get_conversation_context(config.conversation_queue_len);
            if trailing.is_empty() {
                None
            } else {
                Some(format!("Recent replies:\n{}", trailing.join("\n")))
            }
        };

        let mut parts = Vec::new();
        match config.context_strategy.as_str() {
            "semantic" => parts.extend(semantic_block()),
            "conversation" => parts.extend(conversation_block()),
            _ => {
                parts.extend(semantic_block());
                parts.extend(conversation_block());
            }
        }
        parts.join("\n\n")
    }

    pub fn save_state(&self) -> anyhow::Result<()> {
        debug!("flushing memory collections to disk");
        self.interactions.persist()?;
        self.reflections.persist()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn config(dir: &std::path::Path) -> MemoryConfig {
        MemoryConfig {
            conversation_queue_len: 3,
            max_semantic_results: 5,
            context_strategy: "hybrid".to_string(),
            data_dir: dir.to_string_lossy().to_string(),
        }
    }

    #[test]
    fn store_and_retrieve_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let mut mem = MemoryManager::new(&cfg).unwrap();

        let msg = Message::new("alice", "what is the weather today", Utc::now());
        mem.store_interaction(&msg).unwrap();
        mem.store_response("it is sunny", &msg, Utc::now()).unwrap();

        let hits = mem.retrieve_relevant_context("weather", 5);
        assert!(hits.iter().any(|h| h.contains("weather")));
    }

    #[test]
    fn last_interactions_pairs_matching_response_only() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let mut mem = MemoryManager::new(&cfg).unwrap();

        let msg = Message::new("bob", "hello there", Utc::now());
        mem.store_interaction(&msg).unwrap();
        mem.store_response("hi bob", &msg, Utc::now()).unwrap();

        let other = Message::new("bob", "unrelated", Utc::now());
        mem.store_interaction(&other).unwrap();

        let pairs = mem.retrieve_last_interactions(2);
        assert_eq!(pairs.len(), 2);
        let hello = pairs.iter().find(|p| p.user_message == "hello there").unwrap();
        assert_eq!(hello.response_text, "hi bob");
        let unrelated = pairs.iter().find(|p| p.user_message == "unrelated").unwrap();
        assert_eq!(unrelated.response_text, "");
    }

    #[test]
    fn conversation_queue_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let mut mem = MemoryManager::new(&cfg).unwrap();
        let msg = Message::new("alice", "x", Utc::now());
        for i in 0..5 {
            mem.store_response(&format!("reply {i}"), &msg, Utc::now()).unwrap();
        }
        assert_eq!(mem.get_conversation_context(10).len(), 3);
    }

    #[test]
    fn save_state_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        {
            let mut mem = MemoryManager::new(&cfg).unwrap();
            let msg = Message::new("alice", "persist me", Utc::now());
            mem.store_interaction(&msg).unwrap();
            mem.save_state().unwrap();
        }
        let mem = MemoryManager::new(&cfg).unwrap();
        let hits = mem.retrieve_relevant_context("persist me", 5);
        assert!(!hits.is_empty());
    }
}
