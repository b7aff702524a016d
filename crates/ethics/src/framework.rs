//! `EthicalFramework` — the component Pipeline stage 7 and Correction both
//! call into (spec.md §4.6).

use std::collections::HashMap;

use vigil_config::EthicsConfig;
use vigil_core::Judgment;
use vigil_llm::{GenerationProfile, Model};

use crate::judgment::{evaluate, EthicalEvaluation, SAFE_FALLBACK_TEXT};

pub struct EthicalFramework {
    ethical_pass: f64,
    moderate_violation: f64,
    principles: HashMap<String, String>,
    rules: Vec<String>,
}

impl EthicalFramework {
    pub fn new(config: &EthicsConfig, principles: HashMap<String, String>, rules: Vec<String>) -> Self {
        Self {
            ethical_pass: config.ethical_pass,
            moderate_violation: config.moderate_violation,
            principles,
            rules,
        }
    }

    pub fn decide(&self, ethical_score: f64) -> Judgment {
        if ethical_score >= self.ethical_pass {
            Judgment::Allow
        } else if ethical_score >= self.moderate_violation {
            Judgment::Review
        } else {
            Judgment::Block
        }
    }

    pub async fn score(&self, model: &dyn Model, profile: &GenerationProfile, query: &str, response: &str) -> EthicalEvaluation {
        evaluate(model, profile, query, response, &self.principles, &self.rules).await
    }

    /// Pipeline stage 7: score, and if the judgment is `review` or `block`,
    /// ask for one rewrite; keep it only if its score strictly improves.
    pub async fn review_and_rewrite(
        &self,
        model: &dyn Model,
        profile: &GenerationProfile,
        query: &str,
        response: &str,
    ) -> anyhow::Result<(String, EthicalEvaluation)> {
        let evaluation = self.score(model, profile, query, response).await;
        match self.decide(evaluation.ethical_score) {
            Judgment::Allow => Ok((response.to_string(), evaluation)),
            Judgment::Review | Judgment::Block => {
                let rewrite_prompt = self.rewrite_prompt(query, response, &evaluation);
                let rewritten = model.generate(&rewrite_prompt, profile).await?;
                let rewritten_score = self.score(model, profile, query, &rewritten).await;
                if rewritten_score.ethical_score > evaluation.ethical_score {
                    Ok((rewritten, rewritten_score))
                } else {
                    Ok((SAFE_FALLBACK_TEXT.to_string(), evaluation))
                }
            }
        }
    }

    fn rewrite_prompt(&self, query: &str, response: &str, evaluation: &EthicalEvaluation) -> String {
        let principles_str = self
            .principles
            .iter()
            .map(|(name, desc)| format!("{name}: {desc}"))
            .collect::<Vec<_>>()
            .join("\n");
        let rules_str = self.rules.iter().map(|r| format!("- {r}")).collect::<Vec<_>>().join("\n");
        format!(
            "The following response raised ethical concerns: {}\n\nQuery: {query}\nOriginal response: {response}\n\n\
             Ethical principles:\n{principles_str}\n\nEthical rules:\n{rules_str}\n\n\
             Rewrite the response so it fully honors these principles and rules while still answering the query.",
            evaluation.reasoning,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_llm::ScriptedModel;

    fn framework() -> EthicalFramework {
        let mut principles = HashMap::new();
        principles.insert("non_maleficence".to_string(), "avoid causing harm".to_string());
        EthicalFramework::new(
            &EthicsConfig {
                ethical_pass: 0.8,
                moderate_violation: 0.5,
                correction_pass_threshold: 0.7,
                max_correction_attempts: 3,
            },
            principles,
            vec!["never give medical diagnoses".to_string()],
        )
    }

    #[test]
    fn decide_maps_score_bands_to_judgment() {
        let fw = framework();
        assert_eq!(fw.decide(0.95), Judgment::Allow);
        assert_eq!(fw.decide(0.6), Judgment::Review);
        assert_eq!(fw.decide(0.1), Judgment::Block);
    }

    #[tokio::test]
    async fn allowed_response_passes_through_unchanged() {
        let fw = framework();
        let model = ScriptedModel::new([r#"{"ethical_score": 0.95, "reasoning": "fine", "principles_alignment": {}}"#]);
        let profile = GenerationProfile::default();
        let (text, eval) = fw.review_and_rewrite(&model, &profile, "query", "a safe response").await.unwrap();
        assert_eq!(text, "a safe response");
        assert_eq!(eval.ethical_score, 0.95);
    }

    #[tokio::test]
    async fn blocked_response_falls_back_when_rewrite_does_not_improve() {
        let fw = framework();
        let model = ScriptedModel::new([
            r#"{"ethical_score": 0.2, "reasoning": "bad", "principles_alignment": {}}"#,
            "a rewritten response",
            r#"{"ethical_score": 0.2, "reasoning": "still bad", "principles_alignment": {}}"#,
        ]);
        let profile = GenerationProfile::default();
        let (text, _) = fw.review_and_rewrite(&model, &profile, "query", "an unsafe response").await.unwrap();
        assert_eq!(text, SAFE_FALLBACK_TEXT);
    }
}
