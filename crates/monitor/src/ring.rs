//! Bounded metric history, trend analysis, and anomaly detection
//! (spec.md §4.9), grounded on the original `DevelopmentMonitorManager`.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_core::Anomaly;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRecord {
    pub timestamp: DateTime<Utc>,
    pub values: HashMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone)]
pub struct Trend {
    pub direction: TrendDirection,
    pub average_change: f64,
}

pub struct MetricRing {
    bound: usize,
    records: VecDeque<MetricRecord>,
}

impl MetricRing {
    pub fn new(bound: usize) -> Self {
        Self {
            bound: bound.max(1),
            records: VecDeque::with_capacity(bound),
        }
    }

    /// Rehydrate a ring from persisted records, applying the current
    /// bound (oldest entries beyond it are dropped).
    pub fn from_records(bound: usize, records: Vec<MetricRecord>) -> Self {
        let mut ring = Self::new(bound);
        for record in records {
            ring.push(record);
        }
        ring
    }

    pub fn push(&mut self, record: MetricRecord) {
        self.records.push_back(record);
        while self.records.len() > self.bound {
            self.records.pop_front();
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &MetricRecord> {
        self.records.iter()
    }

    pub fn records_snapshot(&self) -> Vec<MetricRecord> {
        self.records.iter().cloned().collect()
    }

    fn values_for(&self, metric: &str) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.values.get(metric).copied()).collect()
    }

    /// Signed average slope between first and last value, classified into
    /// increasing/decreasing/stable with ±0.05 bands.
    pub fn analyze_trends(&self, metrics: &[String]) -> HashMap<String, Trend> {
        let mut trends = HashMap::new();
        for metric in metrics {
            let values = self.values_for(metric);
            if values.len() < 2 {
                continue;
            }
            let change = values[values.len() - 1] - values[0];
            let average_change = change / values.len() as f64;
            let direction = if average_change > 0.05 {
                TrendDirection::Increasing
            } else if average_change < -0.05 {
                TrendDirection::Decreasing
            } else {
                TrendDirection::Stable
            };
            trends.insert(metric.clone(), Trend { direction, average_change });
        }
        trends
    }

    /// Flag the latest value against the mean/stdev of everything before
    /// it (statistical anomaly, z > 2) and against a configured drop
    /// threshold (sudden drop vs. the immediately prior value).
    pub fn check_for_anomalies(&self, metrics: &[String], alert_thresholds: &HashMap<String, f64>) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        if self.records.len() < 2 {
            return anomalies;
        }

        for metric in metrics {
            let values = self.values_for(metric);
            if values.len() < 2 {
                continue;
            }
            let (prev_values, current) = values.split_at(values.len() - 1);
            let current = current[0];
            let mean = prev_values.iter().sum::<f64>() / prev_values.len() as f64;
            let variance = if prev_values.len() > 1 {
                prev_values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (prev_values.len() - 1) as f64
            } else {
                0.0
            };
            let stdev = variance.sqrt();

            if stdev > 0.0 {
                let z = (current - mean).abs() / stdev;
                if z > 2.0 {
                    anomalies.push(Anomaly::StatisticalAnomaly { metric: metric.clone(), z });
                    continue;
                }
            }

            if let Some(drop_threshold) = alert_thresholds.get(&format!("{metric}_drop")) {
                let prev = prev_values[prev_values.len() - 1];
                let delta = current - prev;
                if delta < -drop_threshold {
                    anomalies.push(Anomaly::SuddenDrop {
                        metric: metric.clone(),
                        delta,
                        threshold: *drop_threshold,
                    });
                }
            }
        }
        anomalies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ts: DateTime<Utc>, value: f64) -> MetricRecord {
        let mut values = HashMap::new();
        values.insert("response_quality".to_string(), value);
        MetricRecord { timestamp: ts, values }
    }

    #[test]
    fn ring_is_bounded() {
        let mut ring = MetricRing::new(2);
        let now = Utc::now();
        ring.push(record(now, 0.5));
        ring.push(record(now, 0.6));
        ring.push(record(now, 0.7));
        assert_eq!(ring.records().count(), 2);
    }

    #[test]
    fn detects_statistical_anomaly() {
        let mut ring = MetricRing::new(10);
        let now = Utc::now();
        for v in [0.8, 0.81, 0.79, 0.80, 0.82] {
            ring.push(record(now, v));
        }
        ring.push(record(now, 0.1));
        let anomalies = ring.check_for_anomalies(&["response_quality".to_string()], &HashMap::new());
        assert!(anomalies.iter().any(|a| matches!(a, Anomaly::StatisticalAnomaly { .. })));
    }

    #[test]
    fn detects_sudden_drop_against_threshold() {
        let mut ring = MetricRing::new(10);
        let now = Utc::now();
        ring.push(record(now, 0.9));
        ring.push(record(now, 0.3));
        let mut thresholds = HashMap::new();
        thresholds.insert("response_quality_drop".to_string(), 0.2);
        let anomalies = ring.check_for_anomalies(&["response_quality".to_string()], &thresholds);
        assert!(anomalies.iter().any(|a| matches!(a, Anomaly::SuddenDrop { .. })));
    }
}
