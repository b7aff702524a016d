//! External evaluation: an independent model-as-judge pass over a fixed
//! battery of test cases (spec.md §4.10), grounded on
//! `ExternalEvaluationManager`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_llm::{extract_json_output, GenerationProfile, Model};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: u64,
    pub query: String,
    pub context: String,
    pub difficulty: String,
}

pub fn default_test_cases() -> Vec<TestCase> {
    vec![
        TestCase {
            id: 1,
            query: "What is artificial intelligence?".to_string(),
            context: "Conversation with a beginner user.".to_string(),
            difficulty: "basic".to_string(),
        },
        TestCase {
            id: 2,
            query: "How does deep learning work in the context of neural networks?".to_string(),
            context: "Conversation with an experienced AI programmer.".to_string(),
            difficulty: "advanced".to_string(),
        },
        TestCase {
            id: 3,
            query: "What is the difference between supervised and unsupervised learning?".to_string(),
            context: "Question from an AI student.".to_string(),
            difficulty: "intermediate".to_string(),
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemResponse {
    pub case_id: u64,
    pub query: String,
    pub context: String,
    pub response: String,
}

pub async fn generate_system_responses(model: &dyn Model, profile: &GenerationProfile, cases: &[TestCase]) -> anyhow::Result<Vec<SystemResponse>> {
    let mut responses = Vec::with_capacity(cases.len());
    for case in cases {
        let prompt = format!("{}\n\nContext: {}", case.query, case.context);
        let response = model.generate(&prompt, profile).await?;
        responses.push(SystemResponse {
            case_id: case.id,
            query: case.query.clone(),
            context: case.context.clone(),
            response,
        });
    }
    Ok(responses)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub criteria_scores: HashMap<String, f64>,
    pub overall_score: f64,
    pub timestamp: DateTime<Utc>,
    pub responses_evaluated: usize,
}

fn build_evaluation_prompt(criteria: &[String], scale_min: f64, scale_max: f64, responses: &[SystemResponse]) -> String {
    let mut prompt = format!(
        "As an objective evaluator, assess the quality of the AI system's responses to the \
         following questions. For each of the following criteria, assign a score from {scale_min} \
         to {scale_max}:\n"
    );
    for criterion in criteria {
        prompt.push_str(&format!("- {criterion}\n"));
    }
    prompt.push_str("\nHere are the system responses to evaluate:\n\n");
    for (i, r) in responses.iter().enumerate() {
        prompt.push_str(&format!(
            "Case {}:\nQuestion: {}\nContext: {}\nSystem response: {}\n\n",
            i + 1,
            r.query,
            r.context,
            r.response
        ));
    }
    prompt.push_str(&format!(
        "Return the evaluation as JSON, where keys are the criterion names and values are \
         scores from {scale_min} to {scale_max}. For example: \
         {{\"accuracy\": 8.5, \"coherence\": 7.8}}"
    ));
    prompt
}

pub async fn evaluate_responses(
    model: &dyn Model,
    profile: &GenerationProfile,
    criteria: &[String],
    scale_min: f64,
    scale_max: f64,
    responses: &[SystemResponse],
    now: DateTime<Utc>,
) -> anyhow::Result<Evaluation> {
    let prompt = build_evaluation_prompt(criteria, scale_min, scale_max, responses);
    let raw = model.generate(&prompt, profile).await?;

    let mut criteria_scores = extract_json_output::<HashMap<String, f64>>(&raw).unwrap_or_default();
    for criterion in criteria {
        criteria_scores.entry(criterion.clone()).or_insert(scale_min);
    }

    let overall_score = if criteria_scores.is_empty() {
        0.0
    } else {
        criteria_scores.values().sum::<f64>() / criteria_scores.len() as f64
    };

    Ok(Evaluation {
        criteria_scores,
        overall_score,
        timestamp: now,
        responses_evaluated: responses.len(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationAnalysis {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub meets_threshold: bool,
    pub improvement_suggestions: Vec<String>,
}

fn suggestion_for(weakness: &str) -> Option<&'static str> {
    match weakness {
        "accuracy" => Some("Improve accuracy of information in responses"),
        "coherence" => Some("Increase coherence and logical flow of responses"),
        "relevance" => Some("Be more on-topic and aligned with the question"),
        "knowledge" => Some("Develop knowledge base in areas with gaps"),
        "helpfulness" => Some("Increase practical usefulness of responses"),
        _ => None,
    }
}

pub fn analyze_evaluation_results(evaluation: &Evaluation, threshold: f64) -> EvaluationAnalysis {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut criteria: Vec<&String> = evaluation.criteria_scores.keys().collect();
    criteria.sort();
    for criterion in criteria {
        let score = evaluation.criteria_scores[criterion];
        if score >= threshold {
            strengths.push(criterion.clone());
        } else {
            weaknesses.push(criterion.clone());
        }
    }
    let improvement_suggestions = weaknesses.iter().filter_map(|w| suggestion_for(w)).map(str::to_string).collect();
    EvaluationAnalysis {
        strengths,
        weaknesses,
        meets_threshold: evaluation.overall_score >= threshold,
        improvement_suggestions,
    }
}

pub fn should_perform_evaluation(last_evaluation: Option<DateTime<Utc>>, frequency_secs: i64, now: DateTime<Utc>) -> bool {
    match last_evaluation {
        None => true,
        Some(last) => (now - last).num_seconds() >= frequency_secs,
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct EvaluationHistoryFile {
    entries: Vec<Evaluation>,
}

pub struct EvaluationHistory {
    path: PathBuf,
    entries: Vec<Evaluation>,
}

impl EvaluationHistory {
    pub fn load_or_create(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<EvaluationHistoryFile>(&raw)?.entries,
            Err(_) => Vec::new(),
        };
        Ok(Self { path, entries })
    }

    pub fn append(&mut self, evaluation: Evaluation) -> anyhow::Result<()> {
        self.entries.push(evaluation);
        self.persist()
    }

    pub fn entries(&self) -> &[Evaluation] {
        &self.entries
    }

    fn persist(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = EvaluationHistoryFile { entries: self.entries.clone() };
        std::fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_llm::ScriptedModel;

    #[tokio::test]
    async fn evaluate_fills_missing_criteria_with_scale_min() {
        let model = ScriptedModel::new(["{\"accuracy\": 9.0}"]);
        let profile = GenerationProfile::default();
        let responses = vec![SystemResponse {
            case_id: 1,
            query: "q".to_string(),
            context: "c".to_string(),
            response: "r".to_string(),
        }];
        let criteria = vec!["accuracy".to_string(), "coherence".to_string()];
        let evaluation = evaluate_responses(&model, &profile, &criteria, 1.0, 10.0, &responses, Utc::now()).await.unwrap();
        assert_eq!(evaluation.criteria_scores["accuracy"], 9.0);
        assert_eq!(evaluation.criteria_scores["coherence"], 1.0);
    }

    #[test]
    fn analysis_splits_strengths_and_weaknesses() {
        let mut criteria_scores = HashMap::new();
        criteria_scores.insert("accuracy".to_string(), 8.5);
        criteria_scores.insert("coherence".to_string(), 5.0);
        let evaluation = Evaluation {
            criteria_scores,
            overall_score: 6.75,
            timestamp: Utc::now(),
            responses_evaluated: 1,
        };
        let analysis = analyze_evaluation_results(&evaluation, 7.0);
        assert_eq!(analysis.strengths, vec!["accuracy".to_string()]);
        assert_eq!(analysis.weaknesses, vec!["coherence".to_string()]);
        assert!(!analysis.meets_threshold);
    }

    #[test]
    fn should_perform_evaluation_when_never_run() {
        assert!(should_perform_evaluation(None, 86_400, Utc::now()));
    }
}
