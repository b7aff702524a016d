use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{Model, ModelError};
use crate::profile::GenerationProfile;

/// An Ollama `/api/generate`-shaped HTTP adapter. Grounded in the teacher's
/// `OllamaClient` (reqwest, one POST per call, model name + prompt body).
#[derive(Debug, Clone)]
pub struct HttpModel {
    client: reqwest::Client,
    base_url: String,
    model_name: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    num_predict: u32,
    repeat_penalty: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl HttpModel {
    pub fn new(base_url: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            model_name: model_name.into(),
        }
    }
}

#[async_trait]
impl Model for HttpModel {
    async fn generate(&self, prompt: &str, profile: &GenerationProfile) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let body = GenerateRequest {
            model: &self.model_name,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: profile.temperature,
                top_p: profile.top_p,
                top_k: profile.top_k,
                num_predict: profile.max_new_tokens,
                repeat_penalty: profile.repetition_penalty,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ModelError::RequestFailed(format!("http status {}", resp.status())));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ModelError::RequestFailed(e.to_string()))?;

        Ok(parsed.response)
    }

    async fn save_checkpoint(&self, path: &str) -> Result<(), ModelError> {
        // The HTTP backend has no local state to snapshot; record the active
        // model name so rollback at least restores the selection.
        tokio::fs::write(path, &self.model_name)
            .await
            .map_err(|e| ModelError::CheckpointFailed(e.to_string()))
    }

    async fn load_checkpoint(&self, path: &str) -> Result<(), ModelError> {
        match tokio::fs::read_to_string(path).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(?e, path, "load_checkpoint: no checkpoint to restore");
                Err(ModelError::CheckpointFailed(e.to_string()))
            }
        }
    }
}
