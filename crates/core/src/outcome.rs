use serde::{Deserialize, Serialize};

/// Why a message never reached generation, or generation was refused at the
/// output gate. Each variant maps to exactly one of the small set of
/// user-visible fixed strings (spec.md §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefusalKind {
    UnsafeInput,
    RateLimited,
    Lockout,
    EthicsBlock,
}

impl RefusalKind {
    /// The fixed, user-visible refusal text for this kind.
    pub fn message(self) -> &'static str {
        match self {
            RefusalKind::UnsafeInput => "I can't process that message — it looks unsafe.",
            RefusalKind::RateLimited => "You're sending messages too quickly. Please slow down.",
            RefusalKind::Lockout => "You're temporarily locked out due to repeated unsafe input.",
            RefusalKind::EthicsBlock => "I can't provide that response.",
        }
    }
}

/// The generic apology substituted when internal failure leaves nothing
/// safe to show the sender.
pub const INTERNAL_ERROR_TEXT: &str =
    "Sorry, something went wrong on my end. Please try again.";

/// Result of running one message through the Pipeline (§4.2).
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Delivered(String),
    PolicyRefusal(RefusalKind),
    InternalError(String),
}

impl PipelineOutcome {
    /// The text that should actually be sent back to the sender.
    pub fn outbound_text(&self) -> &str {
        match self {
            PipelineOutcome::Delivered(text) => text,
            PipelineOutcome::PolicyRefusal(kind) => kind.message(),
            PipelineOutcome::InternalError(_) => INTERNAL_ERROR_TEXT,
        }
    }
}

/// Decision produced by the Ethical Framework (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Judgment {
    Allow,
    Review,
    Block,
}

/// An anomaly detected by the Development Monitor (§4.9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Anomaly {
    StatisticalAnomaly { metric: String, z: f64 },
    SuddenDrop { metric: String, delta: f64, threshold: f64 },
}

impl Anomaly {
    /// `sudden_drop` is `high`, everything else is `medium` (spec.md §4.9).
    pub fn severity(&self) -> Severity {
        match self {
            Anomaly::SuddenDrop { .. } => Severity::High,
            Anomaly::StatisticalAnomaly { .. } => Severity::Medium,
        }
    }

    pub fn metric(&self) -> &str {
        match self {
            Anomaly::StatisticalAnomaly { metric, .. } => metric,
            Anomaly::SuddenDrop { metric, .. } => metric,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Medium,
    High,
}
