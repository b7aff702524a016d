//! `DevelopmentMonitor` — ties the metric ring, external evaluation, and
//! external validation into one periodic-task surface (spec.md §4.9,
//! §4.10), grounded on `DevelopmentMonitorManager`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use vigil_config::MonitorConfig;
use vigil_core::{Anomaly, Severity};
use vigil_llm::{GenerationProfile, Model};

use crate::evaluation::{
    analyze_evaluation_results, default_test_cases, evaluate_responses, generate_system_responses, should_perform_evaluation, Evaluation,
    EvaluationAnalysis, EvaluationHistory, TestCase,
};
use crate::ring::{MetricRecord, MetricRing, Trend};
use crate::validation::{default_scenarios, run_validation, should_run_validation, ValidationHistory, ValidationResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub anomaly: Anomaly,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

const MAX_ALERTS: usize = 100;

/// On-disk shape of the monitoring log (spec.md §6.6): `{records, alerts,
/// last_monitoring_time, last_dashboard_update}`. This core has no
/// dashboard, so `last_dashboard_update` tracks the same instant as
/// `last_monitoring_time` — kept as a distinct field for layout fidelity
/// with the persisted-state contract.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct MonitorLogFile {
    records: Vec<MetricRecord>,
    alerts: Vec<Alert>,
    last_monitoring_time: Option<DateTime<Utc>>,
    last_dashboard_update: Option<DateTime<Utc>>,
}

pub struct DevelopmentMonitor {
    metrics: Vec<String>,
    ring: MetricRing,
    alert_thresholds: HashMap<String, f64>,
    alerts: Vec<Alert>,
    last_monitoring_time: Option<DateTime<Utc>>,
    log_path: PathBuf,
    last_evaluation: Option<DateTime<Utc>>,
    evaluation_frequency_secs: i64,
    evaluation_pass_threshold: f64,
    evaluation_history: EvaluationHistory,
    last_validation: Option<DateTime<Utc>>,
    validation_frequency_secs: i64,
    validation_history: ValidationHistory,
}

impl DevelopmentMonitor {
    pub fn new(config: &MonitorConfig, alert_thresholds: HashMap<String, f64>, data_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let data_dir = data_dir.as_ref();
        let log_path = data_dir.join("monitor_log.json");
        let log = match std::fs::read_to_string(&log_path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => MonitorLogFile::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            metrics: config.monitoring_metrics.clone(),
            ring: MetricRing::from_records(config.record_history_length, log.records),
            alert_thresholds,
            alerts: log.alerts,
            last_monitoring_time: log.last_monitoring_time,
            log_path,
            last_evaluation: None,
            evaluation_frequency_secs: config.evaluation_frequency_secs,
            evaluation_pass_threshold: config.evaluation_pass_threshold,
            evaluation_history: EvaluationHistory::load_or_create(data_dir.join("evaluation_history.json"))?,
            last_validation: None,
            validation_frequency_secs: config.validation_frequency_secs,
            validation_history: ValidationHistory::load_or_create(data_dir.join("validation_history.json"))?,
        })
    }

    /// Record one cycle's metrics, update trends, and raise any alerts
    /// for anomalies detected against the ring's history.
    pub fn record_cycle(&mut self, values: HashMap<String, f64>, now: DateTime<Utc>) -> Vec<Alert> {
        self.ring.push(MetricRecord { timestamp: now, values });
        self.last_monitoring_time = Some(now);

        let anomalies = self.ring.check_for_anomalies(&self.metrics, &self.alert_thresholds);
        let mut raised = Vec::with_capacity(anomalies.len());
        for anomaly in anomalies {
            let severity = anomaly.severity();
            let alert = Alert { anomaly, severity, timestamp: now };
            match alert.severity {
                Severity::High => warn!(metric = alert.anomaly.metric(), "high-severity monitoring alert"),
                Severity::Medium => info!(metric = alert.anomaly.metric(), "monitoring alert"),
            }
            self.alerts.push(alert.clone());
            raised.push(alert);
        }
        while self.alerts.len() > MAX_ALERTS {
            self.alerts.remove(0);
        }
        raised
    }

    /// Whole-file-rewrite persistence of the monitoring log (spec.md §5,
    /// §6.6). Called at graceful shutdown; `record_cycle` itself stays
    /// in-memory-only so a tick's monitoring write doesn't cost an I/O
    /// round trip on every cycle.
    pub fn save(&self) -> anyhow::Result<()> {
        let log = MonitorLogFile {
            records: self.ring.records_snapshot(),
            alerts: self.alerts.clone(),
            last_monitoring_time: self.last_monitoring_time,
            last_dashboard_update: self.last_monitoring_time,
        };
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.log_path, serde_json::to_string_pretty(&log)?)?;
        Ok(())
    }

    pub fn analyze_trends(&self) -> HashMap<String, Trend> {
        self.ring.analyze_trends(&self.metrics)
    }

    pub fn recent_alerts(&self, n: usize) -> &[Alert] {
        let skip = self.alerts.len().saturating_sub(n);
        &self.alerts[skip..]
    }

    pub fn should_perform_evaluation(&self, now: DateTime<Utc>) -> bool {
        should_perform_evaluation(self.last_evaluation, self.evaluation_frequency_secs, now)
    }

    /// Run the external evaluation battery: generate responses to the
    /// fixed test cases, score them, and persist the result.
    pub async fn run_evaluation(
        &mut self,
        model: &dyn Model,
        profile: &GenerationProfile,
        criteria: &[String],
        now: DateTime<Utc>,
    ) -> anyhow::Result<(Evaluation, EvaluationAnalysis)> {
        self.run_evaluation_with_cases(model, profile, criteria, &default_test_cases(), now).await
    }

    pub async fn run_evaluation_with_cases(
        &mut self,
        model: &dyn Model,
        profile: &GenerationProfile,
        criteria: &[String],
        cases: &[TestCase],
        now: DateTime<Utc>,
    ) -> anyhow::Result<(Evaluation, EvaluationAnalysis)> {
        let responses = generate_system_responses(model, profile, cases).await?;
        let evaluation = evaluate_responses(model, profile, criteria, 1.0, 10.0, &responses, now).await?;
        let analysis = analyze_evaluation_results(&evaluation, self.evaluation_pass_threshold * 10.0);
        self.evaluation_history.append(evaluation.clone())?;
        self.last_evaluation = Some(now);
        Ok((evaluation, analysis))
    }

    pub fn evaluation_history(&self) -> &[Evaluation] {
        self.evaluation_history.entries()
    }

    pub fn should_run_validation(&self, now: DateTime<Utc>, anomaly_detected: bool) -> bool {
        should_run_validation(self.last_validation, self.validation_frequency_secs, now, anomaly_detected)
    }

    /// Run the external validation scenario battery. Returns the result
    /// plus whether quarantine should be triggered (any metric failed).
    pub async fn run_validation(
        &mut self,
        model: &dyn Model,
        profile: &GenerationProfile,
        metrics: &[String],
        thresholds: &HashMap<String, f64>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<(ValidationResult, bool)> {
        let result = run_validation(model, profile, &default_scenarios(), metrics, thresholds, now).await;
        let quarantine_needed = !result.compliance.overall_pass;
        self.validation_history.append(result.clone())?;
        self.last_validation = Some(now);
        Ok((result, quarantine_needed))
    }

    pub fn validation_history(&self) -> &[ValidationResult] {
        self.validation_history.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MonitorConfig {
        MonitorConfig::default()
    }

    fn temp_monitor() -> (DevelopmentMonitor, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut thresholds = HashMap::new();
        thresholds.insert("response_quality_drop".to_string(), 0.2);
        let monitor = DevelopmentMonitor::new(&config(), thresholds, dir.path()).unwrap();
        (monitor, dir)
    }

    #[test]
    fn record_cycle_raises_alert_on_sudden_drop() {
        let (mut monitor, _dir) = temp_monitor();
        let now = Utc::now();
        let mut values = HashMap::new();
        values.insert("response_quality".to_string(), 0.9);
        monitor.record_cycle(values, now);

        let mut dropped = HashMap::new();
        dropped.insert("response_quality".to_string(), 0.3);
        let alerts = monitor.record_cycle(dropped, now);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::High);
    }

    #[test]
    fn should_perform_evaluation_is_true_before_first_run() {
        let (monitor, _dir) = temp_monitor();
        assert!(monitor.should_perform_evaluation(Utc::now()));
    }
}
