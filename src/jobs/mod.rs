// Cron job manager: named jobs with schedule strings, one timer task per job,
// phase-tagged execution logging.

mod logger;

pub use logger::{JobEvent, JobLogger, JobPhase};

use crate::stats::CircularBuffer;
use anyhow::Context;
use chrono::Local;
use cron::Schedule;
use futures_util::future::BoxFuture;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// How many execution-log entries are retained across all jobs; oldest
/// entries are dropped first. Per-tick jobs emit a handful of entries per
/// run, so the log must not grow with process uptime.
pub const EVENT_LOG_CAPACITY: usize = 500;

type JobBody = Arc<dyn Fn(JobLogger) -> BoxFuture<'static, anyhow::Result<String>> + Send + Sync>;

struct Job {
    name: String,
    description: String,
    schedule: Schedule,
    body: JobBody,
}

/// Registry and scheduler for named cron jobs. Failures within a run are not
/// retried; the next scheduled tick is the only retry path.
pub struct JobManager {
    jobs: Vec<Arc<Job>>,
    events: Arc<Mutex<CircularBuffer<JobEvent>>>,
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}

/// The cron crate expects a seconds field; accept conventional 5-field
/// expressions by prefixing "0".
fn normalize_cron(expr: &str) -> String {
    if expr.split_whitespace().count() == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    }
}

impl JobManager {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            events: Arc::new(Mutex::new(CircularBuffer::new(EVENT_LOG_CAPACITY))),
        }
    }

    /// Registers a named job. The cron expression is parsed eagerly so a bad
    /// schedule fails at startup, not at first tick.
    pub fn register<F, Fut>(
        &mut self,
        name: &str,
        description: &str,
        cron_expr: &str,
        body: F,
    ) -> anyhow::Result<()>
    where
        F: Fn(JobLogger) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        let schedule = Schedule::from_str(&normalize_cron(cron_expr))
            .with_context(|| format!("job {name}: invalid cron expression {cron_expr:?}"))?;
        self.jobs.push(Arc::new(Job {
            name: name.to_string(),
            description: description.to_string(),
            schedule,
            body: Arc::new(move |logger| Box::pin(body(logger))),
        }));
        tracing::info!(job = name, cron = cron_expr, description, "job registered");
        Ok(())
    }

    pub fn job_names(&self) -> Vec<String> {
        self.jobs.iter().map(|j| j.name.clone()).collect()
    }

    /// Execution log across all jobs, oldest first, capped at
    /// `EVENT_LOG_CAPACITY` entries.
    pub fn events(&self) -> Vec<JobEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .to_vec()
    }

    /// Runs one registered job immediately, outside its schedule.
    pub async fn run_now(&self, name: &str) -> anyhow::Result<()> {
        let job = self
            .jobs
            .iter()
            .find(|j| j.name == name)
            .with_context(|| format!("job {name} is not registered"))?;
        run_job(job, &self.events).await;
        Ok(())
    }

    /// Spawns one timer task per job; each computes its next tick from local
    /// time and stops when the shutdown token is cancelled.
    pub fn spawn(self: &Arc<Self>, shutdown: CancellationToken) -> Vec<tokio::task::JoinHandle<()>> {
        self.jobs
            .iter()
            .map(|job| {
                let job = job.clone();
                let events = self.events.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    loop {
                        let Some(next) = job.schedule.upcoming(Local).next() else {
                            tracing::warn!(job = %job.name, "schedule has no upcoming tick, stopping");
                            break;
                        };
                        let wait = (next - Local::now()).to_std().unwrap_or_default();
                        tokio::select! {
                            _ = tokio::time::sleep(wait) => {
                                run_job(&job, &events).await;
                            }
                            _ = shutdown.cancelled() => {
                                tracing::debug!(job = %job.name, "job scheduler shutting down");
                                break;
                            }
                        }
                    }
                })
            })
            .collect()
    }
}

async fn run_job(job: &Job, events: &Arc<Mutex<CircularBuffer<JobEvent>>>) {
    let logger = JobLogger::new(job.name.clone(), events.clone());
    logger.start();
    match (job.body)(logger.clone()).await {
        Ok(summary) => {
            logger.success(&summary);
            logger.complete(&summary);
        }
        Err(e) => {
            logger.fail(&e);
            logger.complete(&format!("{} finished with error", job.description));
        }
    }
}
