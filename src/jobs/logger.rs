// Phase-tagged execution logging for scheduled jobs.
// Per-run state machine: started -> {progress|info|statistics}* ->
// (success|fail) -> complete. Complete is always emitted.

use crate::stats::CircularBuffer;
use chrono::Utc;
use serde::Serialize;
use std::fmt::Display;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Started,
    Progress,
    Info,
    Statistics,
    Success,
    Fail,
    Complete,
}

/// One entry in a job's execution log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    pub job: String,
    pub phase: JobPhase,
    pub message: String,
    pub timestamp_ms: u64,
}

/// Logger scoped to a single job execution. Every phase is both a structured
/// tracing event and an entry in the shared bounded execution log.
#[derive(Clone)]
pub struct JobLogger {
    job: String,
    events: Arc<Mutex<CircularBuffer<JobEvent>>>,
}

impl JobLogger {
    pub(super) fn new(job: String, events: Arc<Mutex<CircularBuffer<JobEvent>>>) -> Self {
        Self { job, events }
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    fn record(&self, phase: JobPhase, message: String) {
        let event = JobEvent {
            job: self.job.clone(),
            phase,
            message,
            timestamp_ms: Utc::now().timestamp_millis() as u64,
        };
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    pub(super) fn start(&self) {
        tracing::info!(job = %self.job, phase = "started", "job execution started");
        self.record(JobPhase::Started, "execution started".into());
    }

    pub fn progress(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(job = %self.job, phase = "progress", "{}", message);
        self.record(JobPhase::Progress, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(job = %self.job, phase = "info", "{}", message);
        self.record(JobPhase::Info, message);
    }

    /// Machine-parseable key-value dump, distinguishable from free-text lines.
    pub fn statistics(&self, pairs: &[(&str, String)]) {
        let message = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(job = %self.job, phase = "statistics", "{}", message);
        self.record(JobPhase::Statistics, message);
    }

    pub(super) fn success(&self, message: &str) {
        tracing::info!(job = %self.job, phase = "success", "{}", message);
        self.record(JobPhase::Success, message.to_string());
    }

    /// Terminal for the run; no retry until the next scheduled tick.
    pub(super) fn fail(&self, error: &dyn Display) {
        tracing::error!(job = %self.job, phase = "fail", error = %error, "job execution failed");
        self.record(JobPhase::Fail, error.to_string());
    }

    pub(super) fn complete(&self, summary: &str) {
        tracing::info!(job = %self.job, phase = "complete", "{}", summary);
        self.record(JobPhase::Complete, summary.to_string());
    }
}
