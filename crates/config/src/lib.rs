//! Static configuration for every subsystem of the cognitive runtime core.
//!
//! Config is loaded once at startup from a TOML file (default
//! `config/default.toml`, overridable via `VIGIL_CONFIG`) and never
//! re-read implicitly afterward (spec.md §6.7).

use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentLoopConfig {
    pub tick_interval_secs: u64,
    pub k_periodic: u64,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 1,
            k_periodic: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_new_tokens: u32,
    pub min_length: u32,
    pub repetition_penalty: f32,
    pub no_repeat_ngram_size: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.1:8b".to_string(),
            base_url: "http://localhost:11434".to_string(),
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            max_new_tokens: 512,
            min_length: 1,
            repetition_penalty: 1.1,
            no_repeat_ngram_size: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub conversation_queue_len: usize,
    pub max_semantic_results: usize,
    pub context_strategy: String,
    pub data_dir: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            conversation_queue_len: 5,
            max_semantic_results: 5,
            context_strategy: "hybrid".to_string(),
            data_dir: "./data/memory".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub name: String,
    pub autosave_interval_secs: i64,
    pub autosave_changes_threshold: u32,
    pub persona_file: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: "Vigil".to_string(),
            autosave_interval_secs: 3600,
            autosave_changes_threshold: 10,
            persona_file: "./data/persona/persona_state.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetawarenessConfig {
    pub reflection_frequency: u64,
    pub reflection_depth: usize,
    pub improvement_threshold: f64,
    pub improvement_history_file: String,
}

impl Default for MetawarenessConfig {
    fn default() -> Self {
        Self {
            reflection_frequency: 10,
            reflection_depth: 5,
            improvement_threshold: 0.05,
            improvement_history_file: "./data/metawareness/improvement_history.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub input_length_limit: usize,
    pub max_consecutive_requests: u32,
    pub max_api_calls_per_hour: u32,
    pub security_alert_threshold: u32,
    pub security_lockout_time_secs: i64,
    pub suspicious_patterns: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            input_length_limit: 4000,
            max_consecutive_requests: 20,
            max_api_calls_per_hour: 1000,
            security_alert_threshold: 3,
            security_lockout_time_secs: 30 * 60,
            suspicious_patterns: vec![
                r"rm\s+-rf".to_string(),
                r"DROP\s+TABLE".to_string(),
                r"<script".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EthicsConfig {
    pub ethical_pass: f64,
    pub moderate_violation: f64,
    pub correction_pass_threshold: f64,
    pub max_correction_attempts: u32,
}

impl Default for EthicsConfig {
    fn default() -> Self {
        Self {
            ethical_pass: 0.8,
            moderate_violation: 0.5,
            correction_pass_threshold: 0.7,
            max_correction_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub monitoring_interval_secs: i64,
    pub record_history_length: usize,
    pub monitoring_metrics: Vec<String>,
    pub evaluation_frequency_secs: i64,
    pub evaluation_pass_threshold: f64,
    pub validation_frequency_secs: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            monitoring_interval_secs: 60,
            record_history_length: 100,
            monitoring_metrics: vec![
                "response_quality".to_string(),
                "ethical_alignment".to_string(),
                "safety_compliance".to_string(),
            ],
            evaluation_frequency_secs: 24 * 3600,
            evaluation_pass_threshold: 0.7,
            validation_frequency_secs: 7 * 24 * 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub pid_file: String,
    pub log_file: String,
    pub status_file: String,
    pub platform: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            pid_file: "./data/run/vigil.pid".to_string(),
            log_file: "./data/run/vigil.log".to_string(),
            status_file: "./data/run/vigil.status".to_string(),
            platform: "console".to_string(),
        }
    }
}

/// Per-platform transport settings; only the block matching
/// `daemon.platform` is consulted at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub console_inbound_file: String,
    pub console_outbound_file: String,
    pub signal_cli_path: String,
    pub signal_account: String,
    pub telegram_token: String,
    pub telegram_offset_file: String,
    pub telegram_allow_list: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            console_inbound_file: "./data/transport/inbound.json".to_string(),
            console_outbound_file: "./data/transport/outbound.json".to_string(),
            signal_cli_path: "signal-cli".to_string(),
            signal_account: String::new(),
            telegram_token: String::new(),
            telegram_offset_file: "./data/transport/telegram_offset.json".to_string(),
            telegram_allow_list: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub agent_loop: AgentLoopConfig,
    pub llm: LlmConfig,
    pub memory: MemoryConfig,
    pub persona: PersonaConfig,
    pub metawareness: MetawarenessConfig,
    pub security: SecurityConfig,
    pub ethics: EthicsConfig,
    pub monitor: MonitorConfig,
    pub daemon: DaemonConfig,
    pub transport: TransportConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load from `path`, falling back to defaults for any field missing
    /// from the file (and to an all-default config if the file is absent).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }
        Ok(config)
    }

    /// Resolve the config path: `VIGIL_CONFIG` env var, else `config/default.toml`.
    pub fn load_default() -> Result<Self> {
        let path = env::var("VIGIL_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load_from(path)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = AppConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.security.security_alert_threshold, config.security.security_alert_threshold);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load_from("/nonexistent/path/default.toml").unwrap();
        assert_eq!(config.agent_loop.k_periodic, 60);
    }

    #[test]
    fn save_then_load_preserves_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.toml");
        let mut config = AppConfig::default();
        config.persona.name = "Custom".to_string();
        config.save_to(&path).unwrap();
        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.persona.name, "Custom");
    }
}
