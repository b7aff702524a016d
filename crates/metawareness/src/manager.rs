//! `MetawarenessManager` — interaction counter, reflection trigger,
//! experiment queue, and insight list (spec.md §4.5).

use chrono::{DateTime, Utc};
use vigil_config::MetawarenessConfig;
use vigil_llm::{GenerationProfile, Model};
use vigil_memory::InteractionPair;

use crate::experiment::{
    apply_successful, design_experiment, evaluate_experiment, run_experiment, Experiment, ImprovementHistory, ImprovementRecord,
};
use crate::reflect::{process_discoveries, reflect_on_interactions, Discovery};

pub struct MetawarenessManager {
    reflection_frequency: u64,
    reflection_depth: usize,
    improvement_threshold: f64,
    interaction_count: u64,
    self_reflections: Vec<String>,
    insights_from_discoveries: Vec<String>,
    experiments: Vec<Experiment>,
    next_experiment_id: u64,
    improvement_history: ImprovementHistory,
}

impl MetawarenessManager {
    pub fn new(config: &MetawarenessConfig) -> anyhow::Result<Self> {
        Ok(Self {
            reflection_frequency: config.reflection_frequency,
            reflection_depth: config.reflection_depth,
            improvement_threshold: config.improvement_threshold,
            interaction_count: 0,
            self_reflections: Vec::new(),
            insights_from_discoveries: Vec::new(),
            experiments: Vec::new(),
            next_experiment_id: 1,
            improvement_history: ImprovementHistory::load_or_create(&config.improvement_history_file)?,
        })
    }

    pub fn reflection_depth(&self) -> usize {
        self.reflection_depth
    }

    pub fn advance_interaction_count(&mut self) {
        self.interaction_count += 1;
    }

    /// `count > 0 ∧ count mod reflection_frequency = 0`.
    pub fn should_reflect(&self) -> bool {
        self.interaction_count > 0 && self.interaction_count % self.reflection_frequency == 0
    }

    pub async fn reflect(&mut self, model: &dyn Model, profile: &GenerationProfile, interactions: &[InteractionPair]) -> anyhow::Result<String> {
        let reflection = reflect_on_interactions(model, profile, interactions).await?;
        self.self_reflections.push(reflection.clone());
        Ok(reflection)
    }

    pub async fn process_discoveries(&mut self, model: &dyn Model, profile: &GenerationProfile, discoveries: &[Discovery]) -> anyhow::Result<Vec<String>> {
        let insights = process_discoveries(model, profile, discoveries).await?;
        self.insights_from_discoveries.extend(insights.clone());
        Ok(insights)
    }

    pub fn recent_reflections(&self, n: usize) -> Vec<&str> {
        let skip = self.self_reflections.len().saturating_sub(n);
        self.self_reflections[skip..].iter().map(String::as_str).collect()
    }

    pub fn recent_insights(&self, n: usize) -> Vec<&str> {
        let skip = self.insights_from_discoveries.len().saturating_sub(n);
        self.insights_from_discoveries[skip..].iter().map(String::as_str).collect()
    }

    pub fn queue_experiment(&mut self, reflection: &str, metrics: Vec<String>) -> u64 {
        let experiment = design_experiment(self.next_experiment_id, reflection, metrics);
        let id = experiment.id;
        self.next_experiment_id += 1;
        self.experiments.push(experiment);
        id
    }

    pub fn has_planned_experiment(&self) -> bool {
        self.experiments.iter().any(|e| e.status == crate::experiment::ExperimentStatus::Planned)
    }

    /// Run and evaluate the next planned experiment, applying it to
    /// `profile` if it succeeds. Returns whether any change was applied.
    pub async fn run_next_experiment(
        &mut self,
        model: &dyn Model,
        profile: &mut GenerationProfile,
        rate_metric: impl Fn(&str, &str) -> f64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let Some(idx) = self.experiments.iter().position(|e| e.status == crate::experiment::ExperimentStatus::Planned) else {
            return Ok(false);
        };
        run_experiment(&mut self.experiments[idx], profile, model, rate_metric, now).await?;
        evaluate_experiment(&mut self.experiments[idx], self.improvement_threshold);

        let applied: Vec<ImprovementRecord> = apply_successful(std::slice::from_ref(&self.experiments[idx]), profile, now);
        let changed = !applied.is_empty();
        self.improvement_history.append_all(applied)?;
        Ok(changed)
    }

    pub fn improvement_history(&self) -> &[ImprovementRecord] {
        self.improvement_history.records()
    }
}
