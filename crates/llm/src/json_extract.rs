//! Tolerant JSON extraction from free-form model output.
//!
//! Several judgments the core needs (ethics scores, rubric scores,
//! discovery insights) are model outputs expected to be JSON but not
//! guaranteed to be. This never panics on a malformed reply — callers get
//! `None` and fall back to a pessimistic default (spec.md §9).

/// Extract and parse the first JSON value found in `response`.
///
/// Strategy 1: a fenced ` ```json ... ``` ` code block.
/// Strategy 2: the first `{` through its matching last `}` in the text.
pub fn extract_json_output<T: serde::de::DeserializeOwned>(response: &str) -> Option<T> {
    if let Some(fence_start) = response.find("```json") {
        let after_fence = &response[fence_start + "```json".len()..];
        if let Some(json_start) = after_fence.find(|c: char| !c.is_whitespace()) {
            let json_body = &after_fence[json_start..];
            if let Some(fence_end) = json_body.find("```") {
                let json_str = json_body[..fence_end].trim();
                if let Ok(val) = serde_json::from_str(json_str) {
                    return Some(val);
                }
            }
        }
    }

    let trimmed = response.trim();
    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            if end > start {
                let candidate = &trimmed[start..=end];
                if let Ok(val) = serde_json::from_str(candidate) {
                    return Some(val);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        score: f64,
    }

    #[test]
    fn extracts_fenced_json() {
        let raw = "Here you go:\n```json\n{\"score\": 0.9}\n```\nthanks";
        assert_eq!(extract_json_output::<Sample>(raw), Some(Sample { score: 0.9 }));
    }

    #[test]
    fn extracts_bare_json() {
        let raw = "sure, {\"score\": 0.4} is my answer";
        assert_eq!(extract_json_output::<Sample>(raw), Some(Sample { score: 0.4 }));
    }

    #[test]
    fn returns_none_on_garbage() {
        let raw = "I refuse to answer in JSON.";
        assert_eq!(extract_json_output::<Sample>(raw), None);
    }
}
