//! The Agent Loop and Pipeline (spec.md §4.1, §4.2): the component that
//! owns every other subsystem and drives the single-threaded cooperative
//! loop described in §5.

mod agent;
mod defaults;
mod internet;
mod periodic;
mod pipeline;

pub use agent::{Agent, DailyCounter, Discovery, DISCOVERY_CAP, DISCOVERY_WORKING_SET};
pub use internet::SearchResult;
pub use pipeline::run_pipeline;
