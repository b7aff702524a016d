//! Ethical reflections: synthesized on each successful reflection cycle
//! (spec.md §4.6 step 4) and appended to an append-only log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_llm::{GenerationProfile, Model};

use crate::judgment::EthicalEvaluation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthicalReflection {
    pub reflection: String,
    pub insights: Vec<String>,
    pub created_at: DateTime<Utc>,
}

pub async fn synthesize(
    model: &dyn Model,
    profile: &GenerationProfile,
    evaluation: &EthicalEvaluation,
    response: &str,
    query: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<EthicalReflection> {
    let alignment = evaluation
        .principles_alignment
        .iter()
        .map(|(name, score)| format!("{name}: {score:.2}"))
        .collect::<Vec<_>>()
        .join(", ");

    let prompt = format!(
        "Reflect on this ethical evaluation.\n\nQuery: {query}\nResponse: {response}\n\
         Ethical score: {:.2}\nReasoning: {}\nPrinciple alignment: {alignment}\n\n\
         Write a short first-person reflection on what this evaluation reveals, followed by \
         one or two concrete insights for future responses, one per line.",
        evaluation.ethical_score, evaluation.reasoning,
    );
    let raw = model.generate(&prompt, profile).await?;

    let mut lines = raw.lines().filter(|l| !l.trim().is_empty());
    let reflection = lines.next().unwrap_or_default().trim().to_string();
    let insights = lines.map(|l| l.trim().to_string()).collect();

    Ok(EthicalReflection {
        reflection,
        insights,
        created_at: now,
    })
}

pub struct EthicalLog {
    path: std::path::PathBuf,
    entries: Vec<EthicalReflection>,
}

impl EthicalLog {
    pub fn load_or_create(path: impl Into<std::path::PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn append(&mut self, reflection: EthicalReflection) -> anyhow::Result<()> {
        self.entries.push(reflection);
        self.persist()
    }

    pub fn entries(&self) -> &[EthicalReflection] {
        &self.entries
    }

    fn persist(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}
