// Cron scheduler - one task per job, six-field expressions with seconds
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::autopilot::{Autopilot, RunTrigger};
use crate::chat_watch::ChatWatcher;
use crate::client::GameApi;
use crate::config::ScheduleConfig;
use crate::error::{CopilotError, Result};
use crate::indexer::AllianceIndex;
use crate::pilots::PilotKind;

type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type JobFn = Arc<dyn Fn() -> JobFuture + Send + Sync>;

struct ScheduledJob {
    name: String,
    schedule: cron::Schedule,
    job: JobFn,
}

#[derive(Default)]
pub struct Scheduler {
    jobs: Vec<ScheduledJob>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F, Fut>(&mut self, name: &str, expression: &str, job: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let schedule = cron::Schedule::from_str(expression)
            .map_err(|e| CopilotError::Config(format!("invalid cron expression for {}: {}", name, e)))?;

        self.jobs.push(ScheduledJob {
            name: name.to_string(),
            schedule,
            job: Arc::new(move || Box::pin(job()) as JobFuture),
        });
        Ok(())
    }

    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.name.as_str()).collect()
    }

    pub fn next_fire(&self, name: &str) -> Option<DateTime<Utc>> {
        self.jobs
            .iter()
            .find(|j| j.name == name)?
            .schedule
            .upcoming(Utc)
            .next()
    }

    /// Spawn every job. Flipping `shutdown` to true stops them; a job that is
    /// running finishes first.
    pub fn start(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        info!("⏰ Scheduler starting {} job(s)", self.jobs.len());
        self.jobs
            .into_iter()
            .map(|job| tokio::spawn(run_job(job, shutdown.clone())))
            .collect()
    }
}

async fn run_job(job: ScheduledJob, mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let Some(next) = job.schedule.upcoming(Utc).next() else {
            warn!("⏰ {} has no upcoming fire time, stopping", job.name);
            break;
        };
        let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = sleep(wait) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        debug!("⏰ Running {}", job.name);
        (job.job)().await;
    }
    debug!("⏰ {} stopped", job.name);
}

/// The three pilots, the chat watcher and the alliance indexer on their
/// configured schedules.
pub fn default_schedule(
    config: &ScheduleConfig,
    autopilot: Arc<Autopilot>,
    watcher: Arc<ChatWatcher>,
    index: Arc<AllianceIndex>,
    api: Arc<dyn GameApi>,
) -> Result<Scheduler> {
    let mut scheduler = Scheduler::new();

    let pilot_jobs = [
        (PilotKind::YardForeman, config.yard_foreman.as_str()),
        (PilotKind::Harbormaster, config.harbormaster.as_str()),
        (PilotKind::CaptainBlackbeard, config.captain_blackbeard.as_str()),
    ];
    for (kind, expression) in pilot_jobs {
        let autopilot = autopilot.clone();
        scheduler.add(kind.name(), expression, move || {
            let autopilot = autopilot.clone();
            async move {
                // Failures are already logged and broadcast by the autopilot
                let _ = autopilot.run(kind, RunTrigger::Schedule).await;
            }
        })?;
    }

    scheduler.add("chat_watch", &config.chat_watch, move || {
        let watcher = watcher.clone();
        async move {
            if let Err(e) = watcher.poll().await {
                warn!("⚠️ Chat watch failed: {}", e);
            }
        }
    })?;

    scheduler.add("alliance_index", &config.alliance_index, move || {
        let index = index.clone();
        let api = api.clone();
        async move {
            if let Err(e) = index.refresh(api.as_ref()).await {
                warn!("⚠️ Alliance index refresh failed: {}", e);
            }
        }
    })?;

    Ok(scheduler)
}
