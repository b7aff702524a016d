//! Reflection over recent interactions and discovery processing
//! (spec.md §4.5).

use vigil_llm::{GenerationProfile, Model};
use vigil_memory::InteractionPair;

pub fn build_reflection_prompt(interactions: &[InteractionPair]) -> String {
    let mut prompt = String::from(
        "Reflect on the following interactions. Consider patterns in user questions, \
         the quality of your answers, areas for improvement, and what you can learn \
         from these interactions.\n\n",
    );
    for (i, pair) in interactions.iter().enumerate() {
        prompt.push_str(&format!(
            "Interaction {}:\nQuery: {}\nResponse: {}\n\n",
            i + 1,
            pair.user_message,
            pair.response_text
        ));
    }
    prompt.push_str("Your reflection:");
    prompt
}

pub async fn reflect_on_interactions(model: &dyn Model, profile: &GenerationProfile, interactions: &[InteractionPair]) -> anyhow::Result<String> {
    let prompt = build_reflection_prompt(interactions);
    Ok(model.generate(&prompt, profile).await?)
}

/// A discovery surfaced by the Explore periodic task (spec.md §4.11).
#[derive(Debug, Clone)]
pub struct Discovery {
    pub topic: String,
    pub content: String,
    pub source: String,
}

pub async fn process_discoveries(model: &dyn Model, profile: &GenerationProfile, discoveries: &[Discovery]) -> anyhow::Result<Vec<String>> {
    let mut insights = Vec::with_capacity(discoveries.len());
    for discovery in discoveries {
        let prompt = format!(
            "Analyze the following discovery and indicate what insights can be drawn from it \
             for your meta-awareness and understanding of your own thought processes:\n\n\
             Topic: {}\nContent: {}\nSource: {}\n\nYour insights for meta-awareness:",
            discovery.topic, discovery.content, discovery.source
        );
        insights.push(model.generate(&prompt, profile).await?);
    }
    Ok(insights)
}
