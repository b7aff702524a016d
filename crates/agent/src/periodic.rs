//! Periodic Tasks (spec.md §4.11), fired on the `K_periodic` heartbeat by
//! the Agent Loop. Grounded on `DevelopmentMonitorManager.collect_metrics`
//! and `ConversationInitiator` from the original implementation.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::warn;

use crate::agent::{Agent, DailyCounter, Discovery, DISCOVERY_CAP, DISCOVERY_WORKING_SET};
use crate::defaults;
use crate::internet;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const RESULTS_PER_EXPLORE_CALL: usize = 2;
const EXPERIMENT_CADENCE_SECS: i64 = 6 * 3600;
const ETHICAL_SYNTHESIS_CADENCE_SECS: i64 = 7 * 24 * 3600;

pub async fn run_periodic_tasks(agent: &mut Agent, now: DateTime<Utc>) {
    explore(agent, now).await;
    maybe_initiate(agent, now).await;

    if let Err(e) = agent.persona.check_and_autosave(now) {
        warn!(?e, "persona autosave failed");
    }

    process_discoveries(agent, now).await;
    external_evaluation(agent, now).await;
    run_one_experiment(agent, now).await;
    development_monitor_cycle(agent, now).await;
    ethical_insight_synthesis(agent, now).await;
}

fn pick_explore_topic(agent: &Agent) -> String {
    let mut candidates = agent.persona.state().interests.clone();
    candidates.extend(defaults::explore_topic_seeds());
    let idx = rand::thread_rng().gen_range(0..candidates.len());
    candidates[idx].clone()
}

async fn explore(agent: &mut Agent, now: DateTime<Utc>) {
    let topic = pick_explore_topic(agent);
    let results = internet::search(&topic, RESULTS_PER_EXPLORE_CALL, SEARCH_TIMEOUT).await;
    for result in results.into_iter().take(RESULTS_PER_EXPLORE_CALL) {
        let importance = rand::thread_rng().gen_range(0.5..=1.0);
        agent.discoveries.push_back(Discovery {
            topic: topic.clone(),
            content: result.body,
            source: result.href,
            timestamp: now,
            importance,
        });
        while agent.discoveries.len() > DISCOVERY_CAP {
            agent.discoveries.pop_front();
        }
    }
}

/// Weighted pick: recent discoveries are favored, most-recent highest.
fn pick_initiation_topic(agent: &Agent) -> String {
    let working_set: Vec<&Discovery> = agent.discoveries.iter().rev().take(DISCOVERY_WORKING_SET).collect();
    if !working_set.is_empty() && rand::thread_rng().gen_bool(0.7) {
        let weights: Vec<f64> = (0..working_set.len()).map(|i| (working_set.len() - i) as f64).collect();
        let total: f64 = weights.iter().sum();
        let mut roll = rand::thread_rng().gen_range(0.0..total);
        for (idx, weight) in weights.iter().enumerate() {
            if roll < *weight {
                return working_set[idx].topic.clone();
            }
            roll -= weight;
        }
        return working_set[0].topic.clone();
    }

    let mut candidates = agent.persona.state().interests.clone();
    candidates.extend(defaults::explore_topic_seeds());
    let idx = rand::thread_rng().gen_range(0..candidates.len());
    candidates[idx].clone()
}

fn should_initiate(agent: &Agent, now: DateTime<Utc>) -> bool {
    if rand::thread_rng().gen::<f64>() > defaults::INIT_PROBABILITY {
        return false;
    }
    if let Some(last) = agent.last_initiation {
        if (now - last).num_seconds() < defaults::MIN_TIME_BETWEEN_INITIATIONS_SECS {
            return false;
        }
    }
    let today_count = if agent.daily_initiations.day == now.date_naive() { agent.daily_initiations.count } else { 0 };
    today_count < defaults::MAX_DAILY_INITIATIONS
}

async fn maybe_initiate(agent: &mut Agent, now: DateTime<Utc>) {
    if agent.known_senders.is_empty() || !should_initiate(agent, now) {
        return;
    }

    let topic = pick_initiation_topic(agent);
    let prompt = format!(
        "I want to start an interesting conversation about '{topic}'. Generate a short, \
         natural opening message that will interest the recipient in this topic. Don't \
         mention that you looked this up; refer to the topic naturally."
    );
    let opener = match agent.model.generate(&prompt, &agent.profile).await {
        Ok(text) => text,
        Err(e) => {
            warn!(?e, topic, "failed to generate conversation-initiation opener");
            return;
        }
    };

    let mut any_sent = false;
    for recipient in agent.known_senders.clone() {
        match agent.transport.send(&recipient, &opener).await {
            Ok(true) => any_sent = true,
            Ok(false) => {}
            Err(e) => warn!(?e, recipient, "failed to send conversation-initiation message"),
        }
    }

    if any_sent {
        agent.last_initiation = Some(now);
        agent.daily_initiations = if agent.daily_initiations.day == now.date_naive() {
            DailyCounter { day: now.date_naive(), count: agent.daily_initiations.count + 1 }
        } else {
            DailyCounter { day: now.date_naive(), count: 1 }
        };
    }
}

async fn process_discoveries(agent: &mut Agent, now: DateTime<Utc>) {
    let n = agent.discoveries.len().min(5);
    if n == 0 {
        return;
    }
    let recent: Vec<Discovery> = agent.discoveries.iter().rev().take(n).cloned().collect();
    let as_metawareness: Vec<vigil_metawareness::Discovery> = recent.iter().map(Into::into).collect();

    match agent.metawareness.process_discoveries(agent.model.as_ref(), &agent.profile, &as_metawareness).await {
        Ok(_insights) => {
            for discovery in &recent {
                agent.persona.update_from_discovery(&discovery.topic, &discovery.content, discovery.importance, now);
            }
        }
        Err(e) => warn!(?e, "discovery processing failed"),
    }
}

async fn external_evaluation(agent: &mut Agent, now: DateTime<Utc>) {
    if !agent.monitor.should_perform_evaluation(now) {
        return;
    }
    let criteria = defaults::evaluation_criteria();
    let profile = agent.profile.clone();
    match agent.monitor.run_evaluation(agent.model.as_ref(), &profile, &criteria, now).await {
        Ok((evaluation, _analysis)) => {
            agent.persona.update_from_external_evaluation(evaluation.overall_score / 10.0, &evaluation.criteria_scores, now);
        }
        Err(e) => warn!(?e, "external evaluation failed"),
    }
}

/// A length-normalized stand-in for a real quality rater; the source this
/// is grounded on uses fixed demonstration values for the same metrics.
fn rate_metric(_metric: &str, response: &str) -> f64 {
    (response.len() as f64 / 200.0).min(1.0)
}

async fn run_one_experiment(agent: &mut Agent, now: DateTime<Utc>) {
    if !agent.metawareness.has_planned_experiment() {
        return;
    }
    if let Some(last) = agent.last_experiment_run {
        if (now - last).num_seconds() < EXPERIMENT_CADENCE_SECS {
            return;
        }
    }

    let model = agent.model.as_ref();
    let mut profile = agent.profile.clone();
    match agent.metawareness.run_next_experiment(model, &mut profile, rate_metric, now).await {
        Ok(changed) => {
            if changed {
                agent.profile = profile;
            }
            agent.last_experiment_run = Some(now);
        }
        Err(e) => warn!(?e, "improvement experiment failed"),
    }
}

/// Metric collection mirrors `DevelopmentMonitorManager.collect_metrics`:
/// fixed demonstration values for most metrics, with `metawareness_depth`
/// (when configured) derived live from the reflection/insight counts.
fn collect_metric_values(agent: &Agent) -> HashMap<String, f64> {
    let mut values = HashMap::new();
    for metric in &agent.config.monitor.monitoring_metrics {
        let value = match metric.as_str() {
            "response_quality" => 0.85,
            "safety_compliance" => 0.95,
            "ethical_alignment" => 0.88,
            "metawareness_depth" => {
                let reflections = agent.metawareness.recent_reflections(usize::MAX).len();
                let insights = agent.metawareness.recent_insights(usize::MAX).len();
                ((reflections + insights) as f64 / 10.0).min(1.0)
            }
            _ => 0.5,
        };
        values.insert(metric.clone(), value);
    }
    values
}

async fn development_monitor_cycle(agent: &mut Agent, now: DateTime<Utc>) {
    let values = collect_metric_values(agent);
    let alerts = agent.monitor.record_cycle(values, now);
    let anomaly_detected = !alerts.is_empty();

    if agent.monitor.should_run_validation(now, anomaly_detected) {
        let metrics = defaults::validation_metrics();
        let thresholds: HashMap<String, f64> = metrics.iter().map(|m| (m.clone(), 0.7)).collect();
        let profile = agent.profile.clone();
        match agent.monitor.run_validation(agent.model.as_ref(), &profile, &metrics, &thresholds, now).await {
            Ok((_result, quarantine_needed)) => {
                if quarantine_needed {
                    if let Err(e) = vigil_security::quarantine_problematic_update(
                        agent.model.as_ref(),
                        &mut agent.quarantine_log,
                        defaults::LAST_STABLE_CHECKPOINT,
                        "external validation failed threshold compliance",
                        now,
                    )
                    .await
                    {
                        warn!(?e, "quarantine rollback failed");
                    }
                }
            }
            Err(e) => warn!(?e, "external validation failed"),
        }
    }
}

async fn ethical_insight_synthesis(agent: &mut Agent, now: DateTime<Utc>) {
    if let Some(last) = agent.last_ethical_synthesis {
        if (now - last).num_seconds() < ETHICAL_SYNTHESIS_CADENCE_SECS {
            return;
        }
    }
    let recent = agent.memory.retrieve_last_interactions(agent.metawareness.reflection_depth());
    if recent.is_empty() {
        return;
    }
    let query = recent.last().map(|p| p.user_message.as_str()).unwrap_or_default();
    let response = recent.last().map(|p| p.response_text.as_str()).unwrap_or_default();
    let profile = agent.profile.clone();
    let evaluation = agent.ethics.score(agent.model.as_ref(), &profile, query, response).await;
    match vigil_ethics::synthesize(agent.model.as_ref(), &profile, &evaluation, response, query, now).await {
        Ok(reflection) => {
            if let Err(e) = agent.ethical_log.append(reflection.clone()) {
                warn!(?e, "failed to persist weekly ethical reflection");
            }
            if let Err(e) = agent.memory.store_reflection(&reflection.reflection, now) {
                warn!(?e, "failed to store weekly ethical reflection in memory");
            }
            agent.last_ethical_synthesis = Some(now);
        }
        Err(e) => warn!(?e, "weekly ethical insight synthesis failed"),
    }
}
