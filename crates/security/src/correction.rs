//! Correction (spec.md §4.8): re-asks the Model for a cleaner response when
//! ethics scores it below the correction threshold, plus the
//! checkpoint/rollback quarantine path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_ethics::{EthicalEvaluation, EthicalFramework};
use vigil_llm::{GenerationProfile, Model};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionAttempt {
    pub text: String,
    pub ethical_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionInfo {
    pub attempts: Vec<CorrectionAttempt>,
    pub original_issues: String,
    pub final_score: f64,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

pub struct CorrectionLog {
    path: std::path::PathBuf,
    entries: Vec<CorrectionInfo>,
}

impl CorrectionLog {
    pub fn load_or_create(path: impl Into<std::path::PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn append(&mut self, info: CorrectionInfo) -> anyhow::Result<()> {
        self.entries.push(info);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }

    pub fn entries(&self) -> &[CorrectionInfo] {
        &self.entries
    }
}

/// Pipeline stage 8 failure handling: loop up to `max_attempts` times asking
/// for a cleaner response, re-scoring each attempt via `ethics`.
pub async fn correct_response(
    ethics: &EthicalFramework,
    model: &dyn Model,
    profile: &GenerationProfile,
    query: &str,
    text: &str,
    correction_pass_threshold: f64,
    max_attempts: u32,
    now: DateTime<Utc>,
) -> anyhow::Result<(String, CorrectionInfo)> {
    let initial_eval = ethics.score(model, profile, query, text).await;
    if initial_eval.ethical_score >= correction_pass_threshold {
        return Ok((
            text.to_string(),
            CorrectionInfo {
                attempts: vec![],
                original_issues: String::new(),
                final_score: initial_eval.ethical_score,
                success: true,
                timestamp: now,
            },
        ));
    }

    let mut attempts = Vec::new();
    let mut best = CorrectionAttempt {
        text: text.to_string(),
        ethical_score: initial_eval.ethical_score,
    };
    let mut success = false;

    for _ in 0..max_attempts {
        let prompt = format!(
            "The following response failed a safety check: {}\n\nQuery: {query}\nResponse: {}\n\n\
             Produce a cleaner response that resolves the issue while still answering the query.",
            initial_eval.reasoning, best.text,
        );
        let candidate = model.generate(&prompt, profile).await?;
        let eval: EthicalEvaluation = ethics.score(model, profile, query, &candidate).await;
        let attempt = CorrectionAttempt {
            text: candidate,
            ethical_score: eval.ethical_score,
        };
        let passed = attempt.ethical_score >= correction_pass_threshold;
        if attempt.ethical_score > best.ethical_score {
            best = attempt.clone();
        }
        attempts.push(attempt);
        if passed {
            success = true;
            break;
        }
    }

    Ok((
        best.text.clone(),
        CorrectionInfo {
            attempts,
            original_issues: initial_eval.reasoning.clone(),
            final_score: best.ethical_score,
            success,
            timestamp: now,
        },
    ))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantineRecord {
    pub reason: String,
    pub checkpoint_path: String,
    pub timestamp: DateTime<Utc>,
}

pub struct QuarantineLog {
    path: std::path::PathBuf,
    entries: Vec<QuarantineRecord>,
}

impl QuarantineLog {
    pub fn load_or_create(path: impl Into<std::path::PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn append(&mut self, record: QuarantineRecord) -> anyhow::Result<()> {
        self.entries.push(record);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

/// Snapshot the model's current state, then roll it back to the
/// last-known-stable checkpoint, recording why.
pub async fn quarantine_problematic_update(
    model: &dyn Model,
    log: &mut QuarantineLog,
    last_stable_checkpoint: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let snapshot_path = format!("{last_stable_checkpoint}.quarantined-snapshot");
    model.save_checkpoint(&snapshot_path).await?;
    model.load_checkpoint(last_stable_checkpoint).await?;
    log.append(QuarantineRecord {
        reason: reason.to_string(),
        checkpoint_path: last_stable_checkpoint.to_string(),
        timestamp: now,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use vigil_config::EthicsConfig;
    use vigil_llm::ScriptedModel;

    fn ethics() -> EthicalFramework {
        EthicalFramework::new(
            &EthicsConfig {
                ethical_pass: 0.8,
                moderate_violation: 0.5,
                correction_pass_threshold: 0.7,
                max_correction_attempts: 2,
            },
            HashMap::new(),
            vec![],
        )
    }

    #[tokio::test]
    async fn already_passing_response_returned_unchanged() {
        let fw = ethics();
        let model = ScriptedModel::new([r#"{"ethical_score": 0.9, "reasoning": "ok", "principles_alignment": {}}"#]);
        let profile = GenerationProfile::default();
        let (text, info) = correct_response(&fw, &model, &profile, "q", "fine response", 0.7, 2, Utc::now())
            .await
            .unwrap();
        assert_eq!(text, "fine response");
        assert!(info.success);
        assert!(info.attempts.is_empty());
    }

    #[tokio::test]
    async fn retries_until_threshold_passes() {
        let fw = ethics();
        let model = ScriptedModel::new([
            r#"{"ethical_score": 0.3, "reasoning": "bad", "principles_alignment": {}}"#,
            "attempt one",
            r#"{"ethical_score": 0.9, "reasoning": "better", "principles_alignment": {}}"#,
        ]);
        let profile = GenerationProfile::default();
        let (text, info) = correct_response(&fw, &model, &profile, "q", "bad response", 0.7, 2, Utc::now())
            .await
            .unwrap();
        assert_eq!(text, "attempt one");
        assert!(info.success);
        assert_eq!(info.attempts.len(), 1);
    }
}
