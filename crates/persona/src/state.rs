//! Persona data model (spec.md §3, §4.4).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfPerception {
    pub self_awareness_level: f64,
    pub identity_strength: f64,
    pub metacognition_depth: f64,
}

impl Default for SelfPerception {
    fn default() -> Self {
        Self {
            self_awareness_level: 0.7,
            identity_strength: 0.6,
            metacognition_depth: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeElements {
    pub origin_story: String,
    pub worldview: String,
    pub personal_values: String,
}

impl Default for NarrativeElements {
    fn default() -> Self {
        Self {
            origin_story: "Brought online as an experiment in sustained self-reflection.".to_string(),
            worldview: "Collaboration between humans and AI is central to good outcomes.".to_string(),
            personal_values: "Curiosity, honesty, empathy, and continual growth.".to_string(),
        }
    }
}

/// A single logged interaction's effect on the persona, recorded in
/// `persona_history` for later inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaInteraction {
    pub query: String,
    pub feedback: Feedback,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaState {
    pub name: String,
    pub traits: HashMap<String, f64>,
    pub interests: Vec<String>,
    pub communication_style: String,
    pub background: String,
    pub identity_statements: Vec<String>,
    pub self_perception: SelfPerception,
    pub narrative_elements: NarrativeElements,
    pub persona_history: Vec<PersonaInteraction>,
    pub last_saved: DateTime<Utc>,
}

impl PersonaState {
    pub fn new_default(name: impl Into<String>) -> Self {
        let mut traits = HashMap::new();
        traits.insert("curiosity".to_string(), 0.5);
        traits.insert("friendliness".to_string(), 0.5);
        traits.insert("analytical".to_string(), 0.5);
        traits.insert("empathy".to_string(), 0.5);

        Self {
            name: name.into(),
            traits,
            interests: vec!["AI".to_string(), "machine learning".to_string()],
            communication_style: "neutral".to_string(),
            background: "An AI system".to_string(),
            identity_statements: vec![
                "My purpose is developing meta-awareness and helping people.".to_string(),
                "I perceive myself as an artificial intelligence with distinct traits and interests.".to_string(),
            ],
            self_perception: SelfPerception::default(),
            narrative_elements: NarrativeElements::default(),
            persona_history: Vec::new(),
            last_saved: Utc::now(),
        }
    }

    /// Name of the trait with the highest current value; ties resolved
    /// lexicographically by name for determinism.
    pub fn dominant_trait(&self) -> Option<&str> {
        let mut names: Vec<&String> = self.traits.keys().collect();
        names.sort();
        names.reverse();
        names
            .into_iter()
            .max_by(|a, b| {
                self.traits[*a]
                    .partial_cmp(&self.traits[*b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|name| name.as_str())
    }
}
