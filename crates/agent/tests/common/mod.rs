//! Shared scaffolding for scenario integration tests.
//!
//! `Agent::new` reads and writes several state files at relative paths
//! (`./data/...`) that aren't threaded through `AppConfig` — only the
//! memory, persona, and metawareness directories are. Running each
//! scenario from its own temp directory keeps those files from colliding
//! across tests; since the working directory is process-global, the
//! `set_current_dir` calls around it are serialized through `CWD_GUARD`.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use vigil_agent::Agent;
use vigil_config::AppConfig;
use vigil_llm::ScriptedModel;
use vigil_transport::ConsoleTransport;

static CWD_GUARD: Mutex<()> = Mutex::new(());

/// An `Agent` built in an isolated temp directory, with the guard and
/// directory kept alive for as long as the scenario needs them.
pub struct Scenario {
    pub agent: Agent,
    _guard: std::sync::MutexGuard<'static, ()>,
    _dir: TempDir,
}

/// `AppConfig::default()` with `reflection_frequency` pushed out of reach
/// so a scenario's self-reflection cycle (stage 10) never fires
/// mid-test unless a test deliberately dials it back down.
pub fn base_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.metawareness.reflection_frequency = 1_000_000;
    config
}

pub fn scenario(config: AppConfig, model: ScriptedModel, now: DateTime<Utc>) -> Scenario {
    let guard = CWD_GUARD.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = tempfile::tempdir().expect("create scenario tempdir");
    std::env::set_current_dir(dir.path()).expect("chdir into scenario tempdir");

    let transport = ConsoleTransport::new(dir.path().join("inbound.json"), dir.path().join("outbound.json"));
    let agent = Agent::new(config, Box::new(model), Box::new(transport), now).expect("construct scenario agent");

    Scenario { agent, _guard: guard, _dir: dir }
}
