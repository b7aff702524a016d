//! Resolved filesystem locations for one daemon invocation, grounded on
//! the teacher's `DaemonPaths` (`crates/interfaces/cli/src/daemon.rs`).

use std::path::PathBuf;

use vigil_config::AppConfig;

#[derive(Debug, Clone)]
pub struct DaemonPaths {
    pub pid_file: PathBuf,
    pub log_file: PathBuf,
    pub status_file: PathBuf,
    pub platform: String,
}

impl DaemonPaths {
    /// CLI flags (`--pidfile`/`--logfile`/`--platform`) override the
    /// config file, which overrides the built-in defaults.
    pub fn resolve(config: &AppConfig, pidfile: Option<String>, logfile: Option<String>, platform: Option<String>) -> Self {
        Self {
            pid_file: PathBuf::from(pidfile.unwrap_or_else(|| config.daemon.pid_file.clone())),
            log_file: PathBuf::from(logfile.unwrap_or_else(|| config.daemon.log_file.clone())),
            status_file: PathBuf::from(config.daemon.status_file.clone()),
            platform: platform.unwrap_or_else(|| config.daemon.platform.clone()),
        }
    }
}
