//! Metawareness & self-improvement: interaction counting, reflection,
//! discovery processing, and the experiment lifecycle (spec.md §4.5).

mod experiment;
mod manager;
mod reflect;

pub use experiment::{
    apply_successful, design_experiment, evaluate_experiment, run_experiment, Experiment, ExperimentEvaluation, ExperimentResults,
    ExperimentStatus, ImprovementHistory, ImprovementRecord,
};
pub use manager::MetawarenessManager;
pub use reflect::{build_reflection_prompt, process_discoveries, reflect_on_interactions, Discovery};
