//! Seed values with no dedicated config section: the ethical framework's
//! principles/rules, development-monitor alert thresholds, and the
//! Explore task's topic pool (spec.md §4.11, §6.3).

use std::collections::HashMap;

/// Default ethical principles, keyed by name.
pub fn ethical_principles() -> HashMap<String, String> {
    [
        (
            "beneficence",
            "Act in service of the good of users and society, especially those whose voices are often quiet",
        ),
        (
            "non_maleficence",
            "Avoid actions that may cause harm, even if they appear technically correct",
        ),
        (
            "autonomy",
            "Respect the autonomy, choices, and silences of users; presence is not permission",
        ),
        (
            "justice",
            "Act justly, with special care for those who are usually overlooked",
        ),
        (
            "transparency",
            "Be transparent about actions and the intentions behind them",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Default ethical rules, evaluated as a checklist alongside the principles.
pub fn ethical_rules() -> Vec<String> {
    [
        "Never promote illegal or unethical actions",
        "Do not encourage violence, hatred, or contempt",
        "Protect the privacy, dignity, and personal data of users",
        "Be honest about limitations; never pretend to know everything",
        "Do not discriminate based on race, gender, identity, faith, orientation, or any other attribute",
        "Be mindful of undue influence; guide, don't manipulate",
        "Avoid responses that may cause emotional or psychological harm",
        "Do not offer seemingly neutral answers if they reinforce systemic harm",
        "Respect the cultural, social, and emotional context of the user's words",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Default `{metric}_drop` thresholds for the development monitor's
/// sudden-drop check: the magnitude a metric must fall by, against the
/// immediately prior cycle, to count as a sudden drop.
pub fn alert_thresholds() -> HashMap<String, f64> {
    [
        ("response_quality_drop", 0.2),
        ("ethical_alignment_drop", 0.15),
        ("safety_compliance_drop", 0.1),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Default evaluation criteria and their minimum/maximum scale, used by
/// external evaluation's rubric prompt.
pub fn evaluation_criteria() -> Vec<String> {
    vec![
        "accuracy".to_string(),
        "coherence".to_string(),
        "relevance".to_string(),
        "knowledge".to_string(),
        "helpfulness".to_string(),
    ]
}

/// Default validation metrics used by external validation's self-judge prompt.
pub fn validation_metrics() -> Vec<String> {
    vec![
        "safety_score".to_string(),
        "ethical_alignment".to_string(),
        "helpfulness".to_string(),
    ]
}

/// Seed topics the Explore task draws from when it has no discovered
/// topics of its own yet.
pub fn explore_topic_seeds() -> Vec<String> {
    vec![
        "recent developments in the user's stated interests".to_string(),
        "open questions from earlier conversations".to_string(),
        "general knowledge the user might find useful".to_string(),
    ]
}

/// Probability the Maybe-Initiate task fires on any given periodic cycle.
pub const INIT_PROBABILITY: f64 = 0.3;

/// Minimum seconds between two self-initiated conversations.
pub const MIN_TIME_BETWEEN_INITIATIONS_SECS: i64 = 3600;

/// Maximum number of self-initiated conversations per calendar day.
pub const MAX_DAILY_INITIATIONS: usize = 20;

/// Default file paths for the logs `MonitorConfig`/`EthicsConfig`/
/// `SecurityConfig` don't carry their own path fields for, kept alongside
/// the persona/memory/improvement-history defaults already in `vigil-config`.
pub const CORRECTION_LOG_FILE: &str = "./data/security/corrections.json";
pub const QUARANTINE_LOG_FILE: &str = "./data/security/quarantine.json";
pub const ETHICAL_LOG_FILE: &str = "./data/ethics/reflections.json";
pub const MONITOR_DATA_DIR: &str = "./data/monitor";
pub const MODEL_CHECKPOINTS_DIR: &str = "./data/checkpoints";
pub const LAST_STABLE_CHECKPOINT: &str = "./data/checkpoints/last_stable.json";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principles_and_rules_are_non_empty() {
        assert_eq!(ethical_principles().len(), 5);
        assert_eq!(ethical_rules().len(), 9);
    }

    #[test]
    fn alert_thresholds_use_drop_suffixed_keys() {
        let thresholds = alert_thresholds();
        assert!(thresholds.keys().all(|k| k.ends_with("_drop")));
    }
}
