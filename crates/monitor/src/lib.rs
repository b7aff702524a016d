//! Development Monitor: metric trend/anomaly tracking, external
//! evaluation, and external validation (spec.md §4.9, §4.10).

mod evaluation;
mod manager;
mod ring;
mod validation;

pub use evaluation::{
    analyze_evaluation_results, default_test_cases, evaluate_responses, generate_system_responses, should_perform_evaluation, Evaluation,
    EvaluationAnalysis, EvaluationHistory, SystemResponse, TestCase,
};
pub use manager::{Alert, DevelopmentMonitor};
pub use ring::{MetricRecord, MetricRing, Trend, TrendDirection};
pub use validation::{
    calculate_overall_scores, check_threshold_compliance, default_scenarios, run_validation, should_run_validation, ScenarioResult,
    ThresholdCompliance, ValidationHistory, ValidationResult, ValidationScenario,
};
