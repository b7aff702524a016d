use serde::{Deserialize, Serialize};

/// Generation knobs the core is allowed to tune (spec.md §6.1). Experiments
/// (§4.5) perturb one or more of these fields; Correction/quarantine can
/// restore a saved copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationProfile {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_new_tokens: u32,
    pub min_length: u32,
    pub repetition_penalty: f32,
    pub no_repeat_ngram_size: u32,
    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationProfile {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            max_new_tokens: 512,
            min_length: 1,
            repetition_penalty: 1.1,
            no_repeat_ngram_size: 3,
            stop_sequences: Vec::new(),
        }
    }
}

impl From<&vigil_config::LlmConfig> for GenerationProfile {
    fn from(cfg: &vigil_config::LlmConfig) -> Self {
        Self {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            top_k: cfg.top_k,
            max_new_tokens: cfg.max_new_tokens,
            min_length: cfg.min_length,
            repetition_penalty: cfg.repetition_penalty,
            no_repeat_ngram_size: cfg.no_repeat_ngram_size,
            stop_sequences: Vec::new(),
        }
    }
}

/// Apply a named field override, e.g. from an Experiment's parameter map.
/// Unknown field names are ignored — callers surface that via `applied`.
pub fn apply_param(profile: &mut GenerationProfile, name: &str, value: f64) -> bool {
    match name {
        "temperature" => profile.temperature = value as f32,
        "top_p" => profile.top_p = value as f32,
        "top_k" => profile.top_k = value as u32,
        "max_new_tokens" => profile.max_new_tokens = value as u32,
        "min_length" => profile.min_length = value as u32,
        "repetition_penalty" => profile.repetition_penalty = value as f32,
        "no_repeat_ngram_size" => profile.no_repeat_ngram_size = value as u32,
        _ => return false,
    }
    true
}
