//! Ethical review: structured scoring, review/rewrite, and reflection
//! synthesis (spec.md §4.6).

mod framework;
mod judgment;
mod reflection;

pub use framework::EthicalFramework;
pub use judgment::{evaluate, EthicalEvaluation, SAFE_FALLBACK_TEXT};
pub use reflection::{synthesize, EthicalLog, EthicalReflection};
