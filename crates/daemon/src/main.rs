//! `vigil` — the CLI and daemon-lifecycle surface (spec.md §6.5),
//! grounded on the teacher's `crates/interfaces/cli/src/main.rs` use of
//! `clap::Parser`/`Subcommand`, adapted to drive the Agent Loop instead
//! of a chat session.

mod lifecycle;
mod paths;
mod process;
mod status;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vigil_config::AppConfig;

use crate::lifecycle::DAEMON_PROCESS_ENV;
use crate::paths::DaemonPaths;

#[derive(Debug, Parser)]
#[command(name = "vigil", version, about = "A persistent cognitive agent runtime")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the daemon in the background.
    Start {
        #[arg(long)]
        pidfile: Option<String>,
        #[arg(long)]
        logfile: Option<String>,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        force: bool,
    },
    /// Stop the running daemon.
    Stop {
        #[arg(long)]
        pidfile: Option<String>,
    },
    /// Stop then start the daemon.
    Restart {
        #[arg(long)]
        pidfile: Option<String>,
        #[arg(long)]
        logfile: Option<String>,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        force: bool,
    },
    /// Report whether the daemon is running.
    Status {
        #[arg(long)]
        pidfile: Option<String>,
    },
    /// Run the Agent Loop in this process, without forking.
    Foreground {
        #[arg(long)]
        platform: Option<String>,
    },
}

fn exit_code_for(result: &anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = match AppConfig::load_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // The supervised child re-execs with this env var set; it bypasses
    // CLI parsing entirely and runs the Agent Loop directly.
    if std::env::var(DAEMON_PROCESS_ENV).ok().as_deref() == Some("1") {
        let raw_args: Vec<String> = std::env::args().collect();
        let platform = raw_args
            .iter()
            .position(|a| a == "--platform")
            .and_then(|i| raw_args.get(i + 1))
            .cloned()
            .unwrap_or_else(|| config.daemon.platform.clone());
        let status_file = std::path::PathBuf::from(&config.daemon.status_file);
        let result = process::run_daemon_process(config, &platform, &status_file).await;
        if let Err(e) = &result {
            tracing::error!(?e, "agent loop exited with error");
        }
        return exit_code_for(&result);
    }

    let cli = Cli::parse();
    let result = run_command(cli, config).await;
    if let Err(e) = &result {
        eprintln!("{e}");
    }
    exit_code_for(&result)
}

async fn run_command(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Start { pidfile, logfile, platform, force } => {
            let paths = DaemonPaths::resolve(&config, pidfile, logfile, platform);
            lifecycle::daemon_start(&paths, force)
        }
        Commands::Stop { pidfile } => {
            let paths = DaemonPaths::resolve(&config, pidfile, None, None);
            lifecycle::daemon_stop(&paths)
        }
        Commands::Restart { pidfile, logfile, platform, force } => {
            let paths = DaemonPaths::resolve(&config, pidfile, logfile, platform);
            lifecycle::daemon_restart(&paths, force)
        }
        Commands::Status { pidfile } => {
            let paths = DaemonPaths::resolve(&config, pidfile, None, None);
            lifecycle::daemon_status(&paths)
        }
        Commands::Foreground { platform } => {
            let paths = DaemonPaths::resolve(&config, None, None, platform);
            if lifecycle::is_interactive_terminal() {
                println!("running in the foreground; Ctrl-C to stop");
            }
            process::run_daemon_process(config, &paths.platform, &paths.status_file).await
        }
    }
}
