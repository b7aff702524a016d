//! `recent_responses`: the ephemeral, bounded "what I just said" buffer
//! (spec.md §3, §4.3). Lost on restart by design — only the vector store
//! is durable.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct ConversationQueue {
    bound: usize,
    entries: VecDeque<String>,
}

impl ConversationQueue {
    pub fn new(bound: usize) -> Self {
        Self {
            bound: bound.max(1),
            entries: VecDeque::with_capacity(bound),
        }
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.entries.push_back(text.into());
        while self.entries.len() > self.bound {
            self.entries.pop_front();
        }
    }

    /// Up to `n` trailing entries, oldest first.
    pub fn trailing(&self, n: usize) -> Vec<String> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_past_bound() {
        let mut q = ConversationQueue::new(2);
        q.push("a");
        q.push("b");
        q.push("c");
        assert_eq!(q.trailing(10), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn trailing_caps_at_requested_count() {
        let mut q = ConversationQueue::new(5);
        for s in ["a", "b", "c"] {
            q.push(s);
        }
        assert_eq!(q.trailing(2), vec!["b".to_string(), "c".to_string()]);
    }
}
