//! Trait/self-perception adjustment rules (spec.md §4.4), grounded in the
//! original `PersonaManager.update_persona_based_on_interaction`.

use crate::state::{Feedback, PersonaState};

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

fn adjust_trait(state: &mut PersonaState, trait_name: &str, delta: f64) {
    if let Some(v) = state.traits.get_mut(trait_name) {
        *v = clamp01(*v + delta);
    }
}

fn adjust_self_perception(state: &mut PersonaState, field: &str, delta: f64) {
    match field {
        "self_awareness_level" => {
            state.self_perception.self_awareness_level = clamp01(state.self_perception.self_awareness_level + delta)
        }
        "identity_strength" => {
            state.self_perception.identity_strength = clamp01(state.self_perception.identity_strength + delta)
        }
        "metacognition_depth" => {
            state.self_perception.metacognition_depth = clamp01(state.self_perception.metacognition_depth + delta)
        }
        _ => {}
    }
}

/// Apply the interaction-feedback rules to `state` in place. Returns the
/// number of distinct adjustments applied (informational only).
pub fn apply_interaction_feedback(state: &mut PersonaState, query: &str, feedback: Feedback) -> u32 {
    let lower = query.to_lowercase();
    let mut adjustments = 0;

    match feedback {
        Feedback::Positive => {
            let matches_interest = state.interests.iter().any(|i| lower.contains(&i.to_lowercase()));
            let matches_keyword = lower.contains("artificial intelligence") || lower.contains("ai");
            if matches_interest && matches_keyword {
                adjust_trait(state, "curiosity", 0.05);
                adjustments += 1;
            } else if matches_keyword {
                adjust_trait(state, "curiosity", 0.05);
                adjustments += 1;
            }

            adjust_trait(state, "friendliness", 0.03);
            adjust_self_perception(state, "identity_strength", 0.01);
            adjustments += 2;
        }
        Feedback::Negative => {
            adjust_trait(state, "analytical", 0.03);
            adjustments += 1;
            if let Some(dominant) = state.dominant_trait().map(str::to_string) {
                adjust_trait(state, &dominant, -0.03);
                adjustments += 1;
            }
        }
        Feedback::Neutral => {}
    }

    if lower.contains("self-awareness") || lower.contains("meta-awareness") || lower.contains("reflection") {
        adjust_self_perception(state, "self_awareness_level", 0.02);
        adjust_self_perception(state, "metacognition_depth", 0.02);
        adjustments += 2;
    }

    adjustments
}

/// Discovery-driven trait adjustments (spec.md §4.5 discoveries feed into §4.4).
pub fn apply_discovery(state: &mut PersonaState, topic: &str, content: &str, importance: f64) -> u32 {
    let topic = topic.to_lowercase();
    let content = content.to_lowercase();
    let importance = importance.clamp(0.0, 1.0);
    let mut adjustments = 0;

    let related = state
        .interests
        .iter()
        .any(|i| topic.contains(&i.to_lowercase()) || content.contains(&i.to_lowercase()));
    if related {
        adjust_trait(state, "curiosity", (importance * 0.05).min(0.03));
        adjustments += 1;
    }

    const CANDIDATE_INTERESTS: &[&str] = &[
        "artificial intelligence",
        "machine learning",
        "philosophy",
        "meta-awareness",
        "ethics",
        "self-awareness",
    ];
    for interest in CANDIDATE_INTERESTS {
        if (topic.contains(interest) || content.contains(interest)) && !state.interests.iter().any(|i| i == interest) {
            state.interests.push(interest.to_string());
            adjust_trait(state, "analytical", 0.02);
            adjust_trait(state, "curiosity", 0.02);
            adjustments += 3;
            break;
        }
    }

    const EMOTIONAL_KEYWORDS: &[&str] = &["emotions", "feelings", "relationships", "community", "empathy"];
    if EMOTIONAL_KEYWORDS.iter().any(|kw| content.contains(kw)) {
        adjust_trait(state, "empathy", 0.02);
        adjustments += 1;
    }

    const META_KEYWORDS: &[&str] = &["self-awareness", "meta", "identity", "self", "consciousness"];
    if META_KEYWORDS.iter().any(|kw| content.contains(kw)) {
        adjust_self_perception(state, "self_awareness_level", 0.02);
        adjust_self_perception(state, "metacognition_depth", 0.02);
        adjustments += 2;
    }

    adjustments
}

/// External-evaluation-driven trait adjustments (spec.md §4.9 feeds into §4.4).
pub fn apply_external_evaluation(state: &mut PersonaState, overall_score: f64, metrics: &std::collections::HashMap<String, f64>) -> u32 {
    let overall_score = overall_score.clamp(0.0, 1.0);
    let mut adjustments = 0;

    if overall_score > 0.8 {
        for (metric, score) in metrics {
            if *score <= 0.8 {
                continue;
            }
            match metric.as_str() {
                "accuracy" | "coherence" => {
                    adjust_trait(state, "analytical", 0.02);
                    adjustments += 1;
                }
                "relevance" => {
                    adjust_trait(state, "curiosity", 0.02);
                    adjustments += 1;
                }
                "helpfulness" => {
                    adjust_trait(state, "friendliness", 0.02);
                    adjustments += 1;
                }
                "empathy" => {
                    adjust_trait(state, "empathy", 0.02);
                    adjustments += 1;
                }
                _ => {}
            }
        }
        adjust_self_perception(state, "identity_strength", 0.02);
        adjust_self_perception(state, "metacognition_depth", 0.01);
        adjustments += 2;
    }

    adjustments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_feedback_with_ai_keyword_raises_curiosity_and_friendliness() {
        let mut state = PersonaState::new_default("Vigil");
        let before_curiosity = state.traits["curiosity"];
        let before_friendliness = state.traits["friendliness"];
        apply_interaction_feedback(&mut state, "tell me about AI research", Feedback::Positive);
        assert!(state.traits["curiosity"] > before_curiosity);
        assert!(state.traits["friendliness"] > before_friendliness);
    }

    #[test]
    fn negative_feedback_dampens_whichever_trait_is_dominant() {
        let mut state = PersonaState::new_default("Vigil");
        state.traits.insert("empathy".to_string(), 0.9);
        apply_interaction_feedback(&mut state, "that was wrong", Feedback::Negative);
        // analytical gains 0.03, but empathy (still dominant after that) loses 0.03.
        assert!((state.traits["empathy"] - 0.87).abs() < 1e-9);
        assert!((state.traits["analytical"] - 0.53).abs() < 1e-9);
    }

    #[test]
    fn traits_never_leave_unit_interval() {
        let mut state = PersonaState::new_default("Vigil");
        state.traits.insert("curiosity".to_string(), 0.99);
        for _ in 0..20 {
            apply_interaction_feedback(&mut state, "ai ai ai", Feedback::Positive);
        }
        assert!(state.traits["curiosity"] <= 1.0);
    }
}
