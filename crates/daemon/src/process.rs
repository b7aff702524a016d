//! The supervised child's body: build the `Agent`, drive its loop, and
//! handle `SIGTERM`/`SIGINT` as a graceful shutdown (spec.md §4.12,
//! §5). Grounded on the teacher's `run_daemon_process`, adapted to drive
//! the Agent Loop directly instead of a chat-completion server behind a
//! Unix socket.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};
use vigil_agent::Agent;
use vigil_config::AppConfig;
use vigil_llm::{HttpModel, Model};
use vigil_transport::{ConsoleTransport, SignalTransport, TelegramTransport, Transport};

use crate::status::{StatusFile, StatusKind};

const SHUTDOWN_NOTICE: &str = "Shutting down for maintenance. I'll be back shortly.";

fn build_model(config: &AppConfig) -> Box<dyn Model> {
    Box::new(HttpModel::new(config.llm.base_url.clone(), config.llm.model.clone()))
}

fn build_transport(config: &AppConfig, platform: &str) -> anyhow::Result<Box<dyn Transport>> {
    match platform {
        "console" => Ok(Box::new(ConsoleTransport::new(
            &config.transport.console_inbound_file,
            &config.transport.console_outbound_file,
        ))),
        "signal" => Ok(Box::new(SignalTransport::new(
            config.transport.signal_cli_path.clone(),
            config.transport.signal_account.clone(),
        ))),
        "telegram" => {
            let allow_list = if config.transport.telegram_allow_list.is_empty() {
                None
            } else {
                Some(config.transport.telegram_allow_list.clone())
            };
            Ok(Box::new(TelegramTransport::new(
                &config.transport.telegram_token,
                &config.transport.telegram_offset_file,
                allow_list,
            )))
        }
        other => anyhow::bail!("unknown transport platform: {other}"),
    }
}

/// Run the Agent Loop until a termination signal arrives, then persist
/// every subsystem and write the status file. Used both by the `start`
/// supervised child and directly by `foreground`.
pub async fn run_daemon_process(config: AppConfig, platform: &str, status_file: &Path) -> anyhow::Result<()> {
    let now = Utc::now();
    let model = build_model(&config);
    let transport = build_transport(&config, platform)?;
    let tick_interval = Duration::from_secs(config.agent_loop.tick_interval_secs.max(1));

    let mut agent = match Agent::new(config, model, transport, now) {
        Ok(agent) => agent,
        Err(e) => {
            error!(?e, "agent initialization failed");
            let _ = StatusFile {
                status: StatusKind::Error,
                start_time: None,
                stop_time: None,
                error_time: Some(Utc::now()),
                pid: std::process::id(),
                platform: Some(platform.to_string()),
            }
            .write(status_file);
            return Err(e);
        }
    };

    StatusFile {
        status: StatusKind::Running,
        start_time: Some(now),
        stop_time: None,
        error_time: None,
        pid: std::process::id(),
        platform: Some(platform.to_string()),
    }
    .write(status_file)?;

    info!(pid = std::process::id(), platform, "agent loop starting");

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
        Ok::<(), anyhow::Error>(())
    };
    #[cfg(not(unix))]
    let terminate = async {
        tokio::signal::ctrl_c().await?;
        Ok::<(), anyhow::Error>(())
    };

    tokio::pin!(terminate);

    let run_loop = async {
        loop {
            let tick_now = Utc::now();
            if let Err(e) = agent.tick(tick_now).await {
                warn!(?e, "tick failed, continuing loop");
            }
            tokio::time::sleep(tick_interval).await;
        }
    };
    tokio::pin!(run_loop);

    tokio::select! {
        _ = &mut run_loop => {}
        result = &mut terminate => {
            result?;
            info!("shutdown signal received, draining and persisting state");
            notify_senders(&mut agent, SHUTDOWN_NOTICE).await;
            agent.persist_all_state(Utc::now())?;
        }
    }

    StatusFile {
        status: StatusKind::Stopped,
        start_time: None,
        stop_time: Some(Utc::now()),
        error_time: None,
        pid: std::process::id(),
        platform: Some(platform.to_string()),
    }
    .write(status_file)?;

    Ok(())
}

async fn notify_senders(agent: &mut Agent, text: &str) {
    for sender in agent.known_senders.clone() {
        if let Err(e) = agent.transport.send(&sender, text).await {
            warn!(?e, sender, "failed to deliver shutdown notice");
        }
    }
}
