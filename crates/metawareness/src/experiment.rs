//! Self-improvement experiments: design, run, evaluate, apply
//! (spec.md §4.5), grounded on the original `SelfImprovementManager`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_llm::{apply_param, GenerationProfile, Model};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    Planned,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResults {
    pub metrics: HashMap<String, f64>,
    pub probe_query: String,
    pub probe_response: String,
    pub ran_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentEvaluation {
    pub success: bool,
    pub improvements: HashMap<String, f64>,
    pub average_improvement: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: u64,
    pub hypothesis: String,
    pub parameters: HashMap<String, f64>,
    pub metrics: Vec<String>,
    pub status: ExperimentStatus,
    pub results: Option<ExperimentResults>,
    pub evaluation: Option<ExperimentEvaluation>,
}

/// Build a planned experiment from a reflection. The reflection text isn't
/// parsed for content here (the original likewise ships a fixed hypothesis
/// template); it anchors the experiment's provenance.
pub fn design_experiment(next_id: u64, _reflection: &str, metrics: Vec<String>) -> Experiment {
    let mut parameters = HashMap::new();
    parameters.insert("temperature".to_string(), 0.5);
    Experiment {
        id: next_id,
        hypothesis: "lowering temperature improves response consistency".to_string(),
        parameters,
        metrics,
        status: ExperimentStatus::Planned,
        results: None,
        evaluation: None,
    }
}

/// Swap the experiment's parameters into a scratch `GenerationProfile`,
/// issue one probe query, collect metric values via `rate_metric`, then
/// restore nothing (the caller holds the original profile separately).
pub async fn run_experiment(
    experiment: &mut Experiment,
    base_profile: &GenerationProfile,
    model: &dyn Model,
    rate_metric: impl Fn(&str, &str) -> f64,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let mut trial_profile = base_profile.clone();
    for (name, value) in &experiment.parameters {
        apply_param(&mut trial_profile, name, *value);
    }

    let probe_query = "Explain the concept of machine learning so a beginner would understand it.";
    let probe_response = model.generate(probe_query, &trial_profile).await?;

    let metrics = experiment
        .metrics
        .iter()
        .map(|metric| (metric.clone(), rate_metric(metric, &probe_response)))
        .collect();

    experiment.status = ExperimentStatus::Completed;
    experiment.results = Some(ExperimentResults {
        metrics,
        probe_query: probe_query.to_string(),
        probe_response,
        ran_at: now,
    });
    Ok(())
}

/// Success iff every metric ≥ `threshold` and the mean delta over
/// threshold is positive.
pub fn evaluate_experiment(experiment: &mut Experiment, threshold: f64) -> ExperimentEvaluation {
    let evaluation = match &experiment.results {
        Some(results) if experiment.status == ExperimentStatus::Completed => {
            let improvements: HashMap<String, f64> = results
                .metrics
                .iter()
                .map(|(metric, value)| (metric.clone(), value - threshold))
                .collect();
            let average_improvement = if improvements.is_empty() {
                0.0
            } else {
                improvements.values().sum::<f64>() / improvements.len() as f64
            };
            let success = average_improvement > 0.0 && results.metrics.values().all(|v| *v >= threshold);
            ExperimentEvaluation {
                success,
                improvements,
                average_improvement,
            }
        }
        _ => ExperimentEvaluation {
            success: false,
            improvements: HashMap::new(),
            average_improvement: 0.0,
        },
    };
    experiment.evaluation = Some(evaluation.clone());
    evaluation
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementRecord {
    pub parameter: String,
    pub old_value: f64,
    pub new_value: f64,
    pub timestamp: DateTime<Utc>,
    pub experiment_id: u64,
}

/// Overwrite `profile` with every parameter from each successful
/// experiment and append an improvement-history record per change.
pub fn apply_successful(experiments: &[Experiment], profile: &mut GenerationProfile, now: DateTime<Utc>) -> Vec<ImprovementRecord> {
    let mut applied = Vec::new();
    for experiment in experiments {
        let Some(evaluation) = &experiment.evaluation else { continue };
        if !evaluation.success {
            continue;
        }
        for (param, new_value) in &experiment.parameters {
            let old_value = current_value(profile, param);
            if apply_param(profile, param, *new_value) {
                applied.push(ImprovementRecord {
                    parameter: param.clone(),
                    old_value,
                    new_value: *new_value,
                    timestamp: now,
                    experiment_id: experiment.id,
                });
            }
        }
    }
    applied
}

fn current_value(profile: &GenerationProfile, name: &str) -> f64 {
    match name {
        "temperature" => profile.temperature as f64,
        "top_p" => profile.top_p as f64,
        "top_k" => profile.top_k as f64,
        "max_new_tokens" => profile.max_new_tokens as f64,
        "min_length" => profile.min_length as f64,
        "repetition_penalty" => profile.repetition_penalty as f64,
        "no_repeat_ngram_size" => profile.no_repeat_ngram_size as f64,
        _ => 0.0,
    }
}

pub struct ImprovementHistory {
    path: std::path::PathBuf,
    records: Vec<ImprovementRecord>,
}

impl ImprovementHistory {
    pub fn load_or_create(path: impl Into<std::path::PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, records })
    }

    pub fn append_all(&mut self, new_records: Vec<ImprovementRecord>) -> anyhow::Result<()> {
        if new_records.is_empty() {
            return Ok(());
        }
        self.records.extend(new_records);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.records)?)?;
        Ok(())
    }

    pub fn records(&self) -> &[ImprovementRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_llm::ScriptedModel;

    #[tokio::test]
    async fn experiment_runs_and_evaluates_success() {
        let mut experiment = design_experiment(1, "responses are too vague", vec!["response_quality".to_string()]);
        let model = ScriptedModel::new(["a crisp explanation"]);
        let profile = GenerationProfile::default();
        run_experiment(&mut experiment, &profile, &model, |_, _| 0.9, Utc::now()).await.unwrap();
        let evaluation = evaluate_experiment(&mut experiment, 0.05);
        assert!(evaluation.success);
    }

    #[test]
    fn apply_successful_overwrites_profile_and_records_change() {
        let mut experiment = design_experiment(1, "r", vec!["response_quality".to_string()]);
        experiment.status = ExperimentStatus::Completed;
        experiment.evaluation = Some(ExperimentEvaluation {
            success: true,
            improvements: HashMap::new(),
            average_improvement: 0.1,
        });
        let mut profile = GenerationProfile::default();
        let before = profile.temperature;
        let records = apply_successful(&[experiment], &mut profile, Utc::now());
        assert_eq!(records.len(), 1);
        assert_ne!(profile.temperature, before);
    }
}
