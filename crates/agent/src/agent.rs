//! The `Agent` struct: the mediator that owns every subsystem and runs
//! the Agent Loop (spec.md §4.1), grounded on the teacher's daemon runtime
//! loop that owns its model, memory, and transport as plain fields.

use std::collections::VecDeque;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use vigil_config::AppConfig;
use vigil_core::Message;
use vigil_ethics::EthicalFramework;
use vigil_llm::{GenerationProfile, Model};
use vigil_memory::MemoryManager;
use vigil_metawareness::MetawarenessManager;
use vigil_monitor::DevelopmentMonitor;
use vigil_persona::PersonaManager;
use vigil_security::{CorrectionLog, QuarantineLog, SecurityGate};
use vigil_transport::Transport;

use crate::defaults;

/// A discovery surfaced by the Explore periodic task (spec.md §4.11),
/// distinct from [`vigil_metawareness::Discovery`] in that it also
/// carries the bookkeeping fields (`timestamp`, `importance`) the
/// bounded discovery list needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discovery {
    pub topic: String,
    pub content: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub importance: f64,
}

impl From<&Discovery> for vigil_metawareness::Discovery {
    fn from(d: &Discovery) -> Self {
        vigil_metawareness::Discovery {
            topic: d.topic.clone(),
            content: d.content.clone(),
            source: d.source.clone(),
        }
    }
}

/// Cap on the Explore task's discovery list (spec.md §4.11 step 1).
pub const DISCOVERY_CAP: usize = 50;
/// Size of the "working set" recent-discoveries weighting draws from.
pub const DISCOVERY_WORKING_SET: usize = 20;

/// Once-per-calendar-day initiation counter (spec.md §4.11 step 2).
#[derive(Debug, Clone, Copy)]
pub struct DailyCounter {
    pub day: NaiveDate,
    pub count: usize,
}

pub struct Agent {
    pub config: AppConfig,
    pub model: Box<dyn Model>,
    pub profile: GenerationProfile,
    pub transport: Box<dyn Transport>,

    pub memory: MemoryManager,
    pub persona: PersonaManager,
    pub metawareness: MetawarenessManager,
    pub ethics: EthicalFramework,
    pub security: SecurityGate,
    pub monitor: DevelopmentMonitor,
    pub correction_log: CorrectionLog,
    pub quarantine_log: QuarantineLog,
    pub ethical_log: vigil_ethics::EthicalLog,

    pub known_senders: Vec<String>,
    pub discoveries: VecDeque<Discovery>,
    pub last_initiation: Option<DateTime<Utc>>,
    pub daily_initiations: DailyCounter,
    pub last_experiment_run: Option<DateTime<Utc>>,
    pub last_ethical_synthesis: Option<DateTime<Utc>>,

    pub iteration: u64,
    pub initial_cycle_skipped: bool,
}

impl Agent {
    pub fn new(config: AppConfig, model: Box<dyn Model>, transport: Box<dyn Transport>, now: DateTime<Utc>) -> anyhow::Result<Self> {
        let profile = GenerationProfile::from(&config.llm);
        let memory = MemoryManager::new(&config.memory)?;
        let persona = PersonaManager::new(&config.persona);
        let metawareness = MetawarenessManager::new(&config.metawareness)?;
        let ethics = EthicalFramework::new(&config.ethics, defaults::ethical_principles(), defaults::ethical_rules());
        let security = SecurityGate::new(&config.security, now);
        let monitor = DevelopmentMonitor::new(&config.monitor, defaults::alert_thresholds(), defaults::MONITOR_DATA_DIR)?;
        let correction_log = CorrectionLog::load_or_create(defaults::CORRECTION_LOG_FILE)?;
        let quarantine_log = QuarantineLog::load_or_create(defaults::QUARANTINE_LOG_FILE)?;
        let ethical_log = vigil_ethics::EthicalLog::load_or_create(defaults::ETHICAL_LOG_FILE)?;

        Ok(Self {
            config,
            model,
            profile,
            transport,
            memory,
            persona,
            metawareness,
            ethics,
            security,
            monitor,
            correction_log,
            quarantine_log,
            ethical_log,
            known_senders: Vec::new(),
            discoveries: VecDeque::new(),
            last_initiation: None,
            daily_initiations: DailyCounter { day: now.date_naive(), count: 0 },
            last_experiment_run: None,
            last_ethical_synthesis: None,
            iteration: 0,
            initial_cycle_skipped: false,
        })
    }

    fn note_sender(&mut self, sender: &str) {
        if !self.known_senders.iter().any(|s| s == sender) {
            self.known_senders.push(sender.to_string());
        }
    }

    /// One Agent Loop tick (spec.md §4.1): drain transport, run the
    /// pipeline over each message, then fire periodic tasks on the
    /// `K_periodic` heartbeat.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let messages: Vec<Message> = match self.transport.poll().await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(?e, "transport poll failed, skipping this tick's ingress");
                Vec::new()
            }
        };

        for message in messages {
            self.note_sender(&message.sender);
            let outcome = crate::pipeline::run_pipeline(self, message.clone(), now).await;
            let text = outcome.outbound_text().to_string();
            if let Err(e) = self.transport.send(&message.sender, &text).await {
                warn!(?e, sender = %message.sender, "failed to send pipeline reply");
            }
        }

        self.iteration += 1;
        if self.iteration % self.config.agent_loop.k_periodic == 0 {
            if !self.initial_cycle_skipped {
                info!("skipping first periodic trigger so the system is warm before firing background work");
                self.initial_cycle_skipped = true;
            } else {
                crate::periodic::run_periodic_tasks(self, now).await;
            }
        }

        Ok(())
    }

    /// Graceful shutdown (spec.md §4.12): persist every subsystem's state.
    /// Correction, quarantine, ethical-reflection, and improvement-history
    /// logs already write on every append (spec.md §5 whole-file-rewrite
    /// discipline), so only the state that accumulates purely in memory
    /// between writes needs an explicit flush here.
    pub fn persist_all_state(&mut self, now: DateTime<Utc>) -> anyhow::Result<()> {
        self.memory.save_state()?;
        self.persona.save(now)?;
        self.monitor.save()?;
        Ok(())
    }
}
