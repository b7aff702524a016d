//! The persona component: mutable self-model, adjustment rules, autosave,
//! and the first-person overlay contract (spec.md §4.4).

mod adjustment;
mod manager;
mod state;

pub use adjustment::{apply_discovery, apply_external_evaluation, apply_interaction_feedback};
pub use manager::PersonaManager;
pub use state::{Feedback, NarrativeElements, PersonaInteraction, PersonaState, SelfPerception};
