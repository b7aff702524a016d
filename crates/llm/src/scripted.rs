use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::model::{Model, ModelError};
use crate::profile::GenerationProfile;

/// A deterministic test double: returns queued responses in order, falling
/// back to echoing the prompt once the queue is empty. Used by unit and
/// scenario tests so they never depend on a live model backend.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    queue: Mutex<VecDeque<String>>,
    checkpoints: Mutex<std::collections::HashMap<String, GenerationProfile>>,
    last_saved: Mutex<Option<GenerationProfile>>,
}

impl ScriptedModel {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            queue: Mutex::new(responses.into_iter().map(Into::into).collect()),
            checkpoints: Mutex::new(std::collections::HashMap::new()),
            last_saved: Mutex::new(None),
        }
    }

    pub fn push(&self, response: impl Into<String>) {
        self.queue.lock().unwrap().push_back(response.into());
    }
}

#[async_trait]
impl Model for ScriptedModel {
    async fn generate(&self, prompt: &str, profile: &GenerationProfile) -> Result<String, ModelError> {
        *self.last_saved.lock().unwrap() = Some(profile.clone());
        let mut queue = self.queue.lock().unwrap();
        if let Some(next) = queue.pop_front() {
            Ok(next)
        } else {
            Ok(format!("echo: {prompt}"))
        }
    }

    async fn save_checkpoint(&self, path: &str) -> Result<(), ModelError> {
        let profile = self.last_saved.lock().unwrap().clone().unwrap_or_default();
        self.checkpoints.lock().unwrap().insert(path.to_string(), profile);
        Ok(())
    }

    async fn load_checkpoint(&self, path: &str) -> Result<(), ModelError> {
        if self.checkpoints.lock().unwrap().contains_key(path) {
            Ok(())
        } else {
            Err(ModelError::CheckpointFailed(format!("no checkpoint at {path}")))
        }
    }
}
