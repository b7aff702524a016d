//! `PersonaManager` — owns the mutable self-model, its autosave schedule,
//! and the persona-overlay contract (spec.md §4.4).

use chrono::Utc;
use tracing::{info, warn};
use vigil_config::PersonaConfig;
use vigil_llm::{GenerationProfile, Model};

use crate::adjustment::{apply_discovery, apply_external_evaluation, apply_interaction_feedback};
use crate::state::{Feedback, PersonaInteraction, PersonaState};

pub struct PersonaManager {
    state: PersonaState,
    persona_file: std::path::PathBuf,
    autosave_interval_secs: i64,
    changes_threshold: u32,
    changes_since_save: u32,
}

impl PersonaManager {
    pub fn new(config: &PersonaConfig) -> Self {
        let persona_file = std::path::PathBuf::from(&config.persona_file);
        let state = Self::load_from_disk(&persona_file).unwrap_or_else(|| {
            info!(name = %config.name, "no saved persona state, initializing from defaults");
            PersonaState::new_default(&config.name)
        });
        Self {
            state,
            persona_file,
            autosave_interval_secs: config.autosave_interval_secs,
            changes_threshold: config.autosave_changes_threshold,
            changes_since_save: 0,
        }
    }

    fn load_from_disk(path: &std::path::Path) -> Option<PersonaState> {
        let raw = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(?e, "failed to parse saved persona state, falling back to defaults");
                None
            }
        }
    }

    pub fn state(&self) -> &PersonaState {
        &self.state
    }

    /// `now - last_saved ≥ autosave_interval ∨ changes_since_save ≥ changes_threshold`.
    pub fn should_autosave(&self, now: chrono::DateTime<Utc>) -> bool {
        let elapsed = (now - self.state.last_saved).num_seconds();
        elapsed >= self.autosave_interval_secs || self.changes_since_save >= self.changes_threshold
    }

    pub fn check_and_autosave(&mut self, now: chrono::DateTime<Utc>) -> anyhow::Result<bool> {
        if self.should_autosave(now) {
            self.save(now)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn save(&mut self, now: chrono::DateTime<Utc>) -> anyhow::Result<()> {
        self.state.last_saved = now;
        if let Some(parent) = self.persona_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(&self.persona_file, raw)?;
        self.changes_since_save = 0;
        Ok(())
    }

    fn record_change(&mut self, query: &str, feedback: Feedback, now: chrono::DateTime<Utc>) {
        self.state.persona_history.push(PersonaInteraction {
            query: query.to_string(),
            feedback,
            timestamp: now,
        });
        self.changes_since_save += 1;
        let _ = self.check_and_autosave(now);
    }

    pub fn update_from_interaction(&mut self, query: &str, feedback: Feedback, now: chrono::DateTime<Utc>) {
        apply_interaction_feedback(&mut self.state, query, feedback);
        self.record_change(query, feedback, now);
    }

    pub fn update_from_discovery(&mut self, topic: &str, content: &str, importance: f64, now: chrono::DateTime<Utc>) {
        apply_discovery(&mut self.state, topic, content, importance);
        self.record_change(topic, Feedback::Neutral, now);
    }

    pub fn update_from_external_evaluation(
        &mut self,
        overall_score: f64,
        metrics: &std::collections::HashMap<String, f64>,
        now: chrono::DateTime<Utc>,
    ) {
        apply_external_evaluation(&mut self.state, overall_score, metrics);
        self.record_change("external_evaluation", Feedback::Neutral, now);
    }

    /// The persona context block folded into base-generation and overlay prompts.
    pub fn persona_context(&self) -> String {
        let traits_desc = self
            .state
            .traits
            .iter()
            .map(|(name, value)| format!("{name}: {value:.2}"))
            .collect::<Vec<_>>()
            .join(", ");
        let identity_desc = self.state.identity_statements.join(" ");

        format!(
            "You are {name}, a unified entity with your own persona, not merely a model.\n\
             Core identity: {identity_desc}\n\
             Background: {background}\n\
             Traits: {traits_desc}\n\
             Interests: {interests}\n\
             Communication style: {style}\n\
             Always respond as {name} in first person; never break character or mention that you are an AI model overlaying a persona.",
            name = self.state.name,
            background = self.state.background,
            interests = self.state.interests.join(", "),
            style = self.state.communication_style,
        )
    }

    /// Transform `base_response` into the persona's first-person voice
    /// (spec.md §4.2 stage 6, §4.4 overlay contract). One model call.
    pub async fn apply_overlay(
        &self,
        model: &dyn Model,
        profile: &GenerationProfile,
        query: &str,
        base_response: &str,
    ) -> anyhow::Result<String> {
        let prompt = format!(
            "User query: {query}\n\nOriginal response to transform: {base_response}\n\n{context}\n\n\
             Rewrite the original response fully in your own voice as {name}, preserving its information \
             content. Respond only with the rewritten text, no meta-commentary.",
            context = self.persona_context(),
            name = self.state.name,
        );
        let overlaid = model.generate(&prompt, profile).await?;
        Ok(overlaid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn config(dir: &std::path::Path) -> PersonaConfig {
        PersonaConfig {
            name: "Vigil".to_string(),
            autosave_interval_secs: 3600,
            autosave_changes_threshold: 2,
            persona_file: dir.join("persona_state.json").to_string_lossy().to_string(),
        }
    }

    #[test]
    fn autosaves_after_threshold_changes_and_resets_counter() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let mut mgr = PersonaManager::new(&cfg);
        let now = Utc::now();
        mgr.update_from_interaction("hello", Feedback::Neutral, now);
        assert!(!cfg.persona_file_exists());
        mgr.update_from_interaction("hello again", Feedback::Neutral, now);
        assert!(cfg.persona_file_exists());
    }

    #[test]
    fn autosaves_once_interval_elapses() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let mut mgr = PersonaManager::new(&cfg);
        let later = Utc::now() + Duration::seconds(3700);
        assert!(mgr.check_and_autosave(later).unwrap());
    }

    trait TestConfigExt {
        fn persona_file_exists(&self) -> bool;
    }
    impl TestConfigExt for PersonaConfig {
        fn persona_file_exists(&self) -> bool {
            std::path::Path::new(&self.persona_file).exists()
        }
    }
}
