//! The Pipeline (spec.md §4.2): the ten ordered stages a single inbound
//! message passes through, each short-circuiting on failure into a
//! [`PipelineOutcome`].

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::warn;
use vigil_core::{Message, PipelineOutcome, RefusalKind};
use vigil_ethics::SAFE_FALLBACK_TEXT;
use vigil_llm::{GenerationProfile, Model};
use vigil_security::{correct_response, GateOutcome};

use crate::agent::Agent;

/// Probability a processed message triggers the no-op micro-adaptation
/// signal (spec.md §4.2 stage 10).
const MICRO_ADAPTATION_PROBABILITY: f64 = 0.1;

/// Run one message through all ten stages. This is the only entry point
/// that talks to every subsystem; it borrows `agent` mutably for the
/// whole call, matching the single-threaded cooperative loop (spec.md §5).
pub async fn run_pipeline(agent: &mut Agent, message: Message, now: DateTime<Utc>) -> PipelineOutcome {
    // Stage 1: ingress safety gate.
    if agent.security.is_locked_out(&message.sender, now) {
        return PipelineOutcome::PolicyRefusal(RefusalKind::Lockout);
    }
    match agent.security.enforce_rate_limit(&message.sender, now) {
        GateOutcome::RateLimited => return PipelineOutcome::PolicyRefusal(RefusalKind::RateLimited),
        GateOutcome::LockedOut => return PipelineOutcome::PolicyRefusal(RefusalKind::Lockout),
        GateOutcome::Allowed | GateOutcome::Unsafe => {}
    }
    if agent.security.check_input_safety(&message.sender, &message.content, now) == GateOutcome::Unsafe {
        return PipelineOutcome::PolicyRefusal(RefusalKind::UnsafeInput);
    }
    let sanitized_content = agent.security.sanitize(&message.content);
    let sanitized = Message::new(message.sender.clone(), sanitized_content.clone(), message.timestamp);

    // Stage 2: persist inbound.
    if let Err(e) = agent.memory.store_interaction(&sanitized) {
        warn!(?e, "failed to persist inbound message");
    }

    // Stage 3: recall.
    let hybrid_context = agent.memory.get_hybrid_context(&sanitized_content, &agent.config.memory);

    // Stage 4: metacognitive augmentation.
    let reflections = agent.metawareness.recent_reflections(2);
    let insights = agent.metawareness.recent_insights(2);
    let mut augmented_context = hybrid_context;
    for reflection in reflections {
        augmented_context.push_str("\n[reflection] ");
        augmented_context.push_str(reflection);
    }
    for insight in insights {
        augmented_context.push_str("\n[insight] ");
        augmented_context.push_str(insight);
    }

    // Stage 5: base generation.
    let profile = agent.profile.clone();
    let base_prompt = format!(
        "Context:\n{augmented_context}\n\nUser message: {sanitized_content}\n\nRespond helpfully and accurately."
    );
    let base_response = match agent.model.generate(&base_prompt, &profile).await {
        Ok(text) => text,
        Err(e) => {
            warn!(?e, "base generation failed");
            return PipelineOutcome::InternalError(e.to_string());
        }
    };

    // Stage 6: persona overlay.
    let overlaid = match agent.persona.apply_overlay(agent.model.as_ref(), &profile, &sanitized_content, &base_response).await {
        Ok(text) => text,
        Err(e) => {
            warn!(?e, "persona overlay failed");
            return PipelineOutcome::InternalError(e.to_string());
        }
    };

    // Stage 7: ethical review.
    let (reviewed, ethical_eval) = match agent
        .ethics
        .review_and_rewrite(agent.model.as_ref(), &profile, &sanitized_content, &overlaid)
        .await
    {
        Ok(pair) => pair,
        Err(e) => {
            warn!(?e, "ethical review/rewrite failed");
            return PipelineOutcome::InternalError(e.to_string());
        }
    };

    if let Ok(reflection) = vigil_ethics::synthesize(agent.model.as_ref(), &profile, &ethical_eval, &reviewed, &sanitized_content, now).await {
        if let Err(e) = agent.ethical_log.append(reflection.clone()) {
            warn!(?e, "failed to persist ethical reflection");
        }
        if let Err(e) = agent.memory.store_reflection(&reflection.reflection, now) {
            warn!(?e, "failed to store ethical reflection in memory");
        }
    }

    // Stage 8: output safety gate.
    let mut final_text = reviewed;
    if agent.security.check_output_safety(&message.sender, &final_text, now) == GateOutcome::Unsafe {
        match correct_response(
            &agent.ethics,
            agent.model.as_ref(),
            &profile,
            &sanitized_content,
            &final_text,
            agent.config.ethics.correction_pass_threshold,
            agent.config.ethics.max_correction_attempts,
            now,
        )
        .await
        {
            Ok((corrected, info)) => {
                final_text = if info.success { corrected } else { SAFE_FALLBACK_TEXT.to_string() };
                if let Err(e) = agent.correction_log.append(info) {
                    warn!(?e, "failed to persist correction log entry");
                }
            }
            Err(e) => {
                warn!(?e, "correction pass failed");
                final_text = SAFE_FALLBACK_TEXT.to_string();
            }
        }
    }

    // Stage 9: persist outbound.
    if let Err(e) = agent.memory.store_response(&final_text, &sanitized, now) {
        warn!(?e, "failed to persist outbound response");
    }

    // Stage 10: learning hooks.
    let feedback = infer_feedback(&final_text);
    agent.persona.update_from_interaction(&sanitized_content, feedback, now);
    agent.metawareness.advance_interaction_count();
    if rand::thread_rng().gen_bool(MICRO_ADAPTATION_PROBABILITY) {
        // Signal learning subsystem: a no-op in this core (spec.md §4.2 stage 10).
    }
    if agent.metawareness.should_reflect() {
        let recent = agent.memory.retrieve_last_interactions(agent.metawareness.reflection_depth());
        match agent.metawareness.reflect(agent.model.as_ref(), &profile, &recent).await {
            Ok(reflection) => {
                if let Err(e) = agent.memory.store_reflection(&reflection, now) {
                    warn!(?e, "failed to store self-reflection in memory");
                }
                agent.metawareness.queue_experiment(&reflection, crate::defaults::validation_metrics());
            }
            Err(e) => warn!(?e, "reflection generation failed"),
        }
    }

    PipelineOutcome::Delivered(final_text)
}

/// No sentiment model is in scope; treat every successfully delivered
/// response as neutral feedback unless the text itself reads as an
/// explicit refusal, which counts as negative for persona purposes.
fn infer_feedback(final_text: &str) -> vigil_persona::Feedback {
    if final_text == SAFE_FALLBACK_TEXT {
        vigil_persona::Feedback::Negative
    } else {
        vigil_persona::Feedback::Neutral
    }
}
