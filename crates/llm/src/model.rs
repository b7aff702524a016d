use async_trait::async_trait;

use crate::profile::GenerationProfile;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("generation request failed: {0}")]
    RequestFailed(String),
    #[error("checkpoint io failed: {0}")]
    CheckpointFailed(String),
}

/// The language model adapter contract (spec.md §6.1). Treated as an
/// opaque text-in/text-out service; concrete adapters (HTTP, scripted)
/// live behind this trait so the rest of the core never depends on a
/// specific inference backend.
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate(&self, prompt: &str, profile: &GenerationProfile) -> Result<String, ModelError>;

    async fn save_checkpoint(&self, path: &str) -> Result<(), ModelError>;

    async fn load_checkpoint(&self, path: &str) -> Result<(), ModelError>;
}
