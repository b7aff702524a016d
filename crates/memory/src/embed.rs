//! Embedding contract. Memory never cares how a vector is produced, only
//! that `EmbedFn` is stable for equal input — grounded in the teacher's
//! `EmbedFn` alias, which likewise decouples storage from a model backend.

use std::sync::Arc;

/// `content -> embedding`. Boxed so callers can plug a real model-backed
/// embedder in behind the same contract the default hashing embedder uses.
pub type EmbedFn = Arc<dyn Fn(&str) -> Vec<f32> + Send + Sync>;

const DEFAULT_DIMS: usize = 64;

/// A deterministic, dependency-free bag-of-words hashing embedding. Good
/// enough to make cosine similarity meaningful for short conversational
/// text without pulling in a real embedding model (out of scope, §6.1).
pub fn default_embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0f32; DEFAULT_DIMS];
    for token in text.split_whitespace() {
        let lower = token.to_lowercase();
        let bucket = fnv1a(lower.as_bytes()) as usize % DEFAULT_DIMS;
        vector[bucket] += 1.0;
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
    vector
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    bytes.iter().fold(OFFSET, |hash, byte| (hash ^ *byte as u64).wrapping_mul(PRIME))
}

pub fn default_embed_fn() -> EmbedFn {
    Arc::new(default_embed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_yields_same_embedding() {
        assert_eq!(default_embed("hello world"), default_embed("hello world"));
    }

    #[test]
    fn empty_text_yields_zero_vector() {
        assert!(default_embed("").iter().all(|v| *v == 0.0));
    }
}
