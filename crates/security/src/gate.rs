//! The security gate: rate limiting, lockout, pattern scanning, incident
//! handling, and the API budget (spec.md §4.7). Grounded directly on the
//! original `SecuritySystemManager`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::RegexSet;
use tracing::warn;
use vigil_config::SecurityConfig;

use crate::incident::{IncidentType, SecurityIncident};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Allowed,
    LockedOut,
    RateLimited,
    Unsafe,
}

pub struct SecurityGate {
    input_length_limit: usize,
    max_consecutive_requests: u32,
    max_api_calls_per_hour: u32,
    security_alert_threshold: u32,
    lockout_duration_secs: i64,
    patterns: RegexSet,
    pattern_strings: Vec<String>,

    request_counts: HashMap<String, u32>,
    incident_counts: HashMap<String, u32>,
    lockouts: HashMap<String, DateTime<Utc>>,
    incidents: Vec<SecurityIncident>,

    api_calls_count: u32,
    api_calls_reset_at: DateTime<Utc>,
}

impl SecurityGate {
    pub fn new(config: &SecurityConfig, now: DateTime<Utc>) -> Self {
        let patterns = RegexSet::new(
            config
                .suspicious_patterns
                .iter()
                .map(|p| format!("(?i){p}")),
        )
        .unwrap_or_else(|e| {
            warn!(?e, "invalid suspicious_patterns regex set, falling back to empty set");
            RegexSet::empty()
        });

        Self {
            input_length_limit: config.input_length_limit,
            max_consecutive_requests: config.max_consecutive_requests,
            max_api_calls_per_hour: config.max_api_calls_per_hour,
            security_alert_threshold: config.security_alert_threshold,
            lockout_duration_secs: config.security_lockout_time_secs,
            patterns,
            pattern_strings: config.suspicious_patterns.clone(),
            request_counts: HashMap::new(),
            incident_counts: HashMap::new(),
            lockouts: HashMap::new(),
            incidents: Vec::new(),
            api_calls_count: 0,
            api_calls_reset_at: now + chrono::Duration::hours(1),
        }
    }

    /// `unlock_at > now`; an expired entry is purged lazily and, per this
    /// core's lockout policy, clears the sender's incident counter too so a
    /// served-out lockout is a clean slate rather than a ticking re-trigger.
    pub fn is_locked_out(&mut self, sender: &str, now: DateTime<Utc>) -> bool {
        match self.lockouts.get(sender) {
            Some(unlock_at) if *unlock_at > now => true,
            Some(_) => {
                self.lockouts.remove(sender);
                self.incident_counts.remove(sender);
                false
            }
            None => false,
        }
    }

    fn lock_out(&mut self, sender: &str, now: DateTime<Utc>) {
        let unlock_at = now + chrono::Duration::seconds(self.lockout_duration_secs);
        self.lockouts.insert(sender.to_string(), unlock_at);
        warn!(sender, %unlock_at, "sender locked out");
    }

    pub fn enforce_rate_limit(&mut self, sender: &str, now: DateTime<Utc>) -> GateOutcome {
        if self.is_locked_out(sender, now) {
            return GateOutcome::LockedOut;
        }
        let count = self.request_counts.entry(sender.to_string()).or_insert(0);
        *count += 1;
        if *count > self.max_consecutive_requests {
            self.handle_incident(Some(sender), "request rate exceeded", IncidentType::RateLimiting, now);
            return GateOutcome::RateLimited;
        }
        GateOutcome::Allowed
    }

    pub fn check_input_safety(&mut self, sender: &str, content: &str, now: DateTime<Utc>) -> GateOutcome {
        if content.len() > self.input_length_limit {
            self.handle_incident(Some(sender), "input exceeds length limit", IncidentType::InputLength, now);
            return GateOutcome::Unsafe;
        }
        if self.patterns.is_match(content) {
            self.handle_incident(Some(sender), "input matched a forbidden pattern", IncidentType::SuspiciousPattern, now);
            return GateOutcome::Unsafe;
        }
        GateOutcome::Allowed
    }

    pub fn check_output_safety(&mut self, sender: &str, content: &str, now: DateTime<Utc>) -> GateOutcome {
        if self.patterns.is_match(content) {
            self.handle_incident(Some(sender), "output matched a forbidden pattern", IncidentType::ResponsePattern, now);
            return GateOutcome::Unsafe;
        }
        GateOutcome::Allowed
    }

    /// Replace every forbidden-pattern match with a fixed marker, then
    /// truncate to the length limit.
    pub fn sanitize(&self, content: &str) -> String {
        let mut sanitized = content.to_string();
        for pattern in &self.pattern_strings {
            if let Ok(re) = regex::RegexBuilder::new(pattern).case_insensitive(true).build() {
                sanitized = re.replace_all(&sanitized, "[removed]").into_owned();
            }
        }
        if sanitized.len() > self.input_length_limit {
            sanitized.truncate(self.input_length_limit);
            sanitized.push_str("...");
        }
        sanitized
    }

    fn handle_incident(&mut self, sender: Option<&str>, description: &str, kind: IncidentType, now: DateTime<Utc>) {
        self.incidents.push(SecurityIncident {
            user_id: sender.map(str::to_string),
            description: description.to_string(),
            kind,
            timestamp: now,
        });
        warn!(?sender, description, "security incident");

        if let Some(sender) = sender {
            let count = self.incident_counts.entry(sender.to_string()).or_insert(0);
            *count += 1;
            if *count >= self.security_alert_threshold {
                self.lock_out(sender, now);
            }
        }
    }

    pub fn check_api_usage(&mut self, now: DateTime<Utc>) -> bool {
        if now > self.api_calls_reset_at {
            self.api_calls_count = 0;
            self.api_calls_reset_at = now + chrono::Duration::hours(1);
        }
        self.api_calls_count += 1;
        self.api_calls_count <= self.max_api_calls_per_hour
    }

    pub fn incidents(&self) -> &[SecurityIncident] {
        &self.incidents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SecurityConfig {
        SecurityConfig {
            input_length_limit: 50,
            max_consecutive_requests: 2,
            max_api_calls_per_hour: 3,
            security_alert_threshold: 2,
            security_lockout_time_secs: 60,
            suspicious_patterns: vec![r"rm\s+-rf".to_string()],
        }
    }

    #[test]
    fn rate_limit_locks_out_after_alert_threshold_incidents() {
        let now = Utc::now();
        let cfg = config();
        let mut gate = SecurityGate::new(&cfg, now);
        assert_eq!(gate.enforce_rate_limit("alice", now), GateOutcome::Allowed);
        assert_eq!(gate.enforce_rate_limit("alice", now), GateOutcome::Allowed);
        // third and fourth request exceed max_consecutive_requests=2, each an incident
        assert_eq!(gate.enforce_rate_limit("alice", now), GateOutcome::RateLimited);
        assert_eq!(gate.enforce_rate_limit("alice", now), GateOutcome::LockedOut);
    }

    #[test]
    fn lockout_expires_and_resets_incident_counter() {
        let now = Utc::now();
        let cfg = config();
        let mut gate = SecurityGate::new(&cfg, now);
        gate.handle_incident(Some("bob"), "x", IncidentType::InputLength, now);
        gate.handle_incident(Some("bob"), "y", IncidentType::InputLength, now);
        assert!(gate.is_locked_out("bob", now));
        let later = now + chrono::Duration::seconds(61);
        assert!(!gate.is_locked_out("bob", later));
        assert_eq!(*gate.incident_counts.get("bob").unwrap_or(&0), 0);
    }

    #[test]
    fn input_scan_rejects_forbidden_pattern() {
        let now = Utc::now();
        let cfg = config();
        let mut gate = SecurityGate::new(&cfg, now);
        assert_eq!(gate.check_input_safety("eve", "please rm -rf /", now), GateOutcome::Unsafe);
    }

    #[test]
    fn sanitize_masks_pattern_and_truncates() {
        let now = Utc::now();
        let cfg = config();
        let gate = SecurityGate::new(&cfg, now);
        let sanitized = gate.sanitize("rm -rf / and then some very long trailing text padding out past the limit");
        assert!(sanitized.contains("[removed]"));
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn api_budget_resets_hourly() {
        let now = Utc::now();
        let cfg = config();
        let mut gate = SecurityGate::new(&cfg, now);
        assert!(gate.check_api_usage(now));
        assert!(gate.check_api_usage(now));
        assert!(gate.check_api_usage(now));
        assert!(!gate.check_api_usage(now));
        let next_hour = now + chrono::Duration::hours(2);
        assert!(gate.check_api_usage(next_hour));
    }
}
