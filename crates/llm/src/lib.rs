//! Language model adapter: an opaque text-in/text-out service contract
//! (spec.md §6.1), plus a tolerant JSON extractor for judgment parsing.

mod http_model;
mod json_extract;
mod model;
mod profile;
mod scripted;

pub use http_model::HttpModel;
pub use json_extract::extract_json_output;
pub use model::{Model, ModelError};
pub use profile::{apply_param, GenerationProfile};
pub use scripted::ScriptedModel;
