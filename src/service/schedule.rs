//! Job scheduling on plain worker threads.
//!
//! Each job owns one thread and one cancellation token. Cron jobs sleep
//! until the next fire time in the local timezone; one-shot jobs sleep for
//! a fixed delay. Sleeping happens in short slices so that
//! [`Scheduler::remove_all_jobs`] returns promptly.

use std::str::FromStr;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::Local;
use cron::Schedule;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Longest uninterrupted sleep while waiting for a trigger.
const SLEEP_SLICE: Duration = Duration::from_secs(1);

/// Parse a crontab expression.
///
/// Standard five-field expressions (`min hour dom mon dow`) get a leading
/// seconds field of `0`; six- and seven-field expressions are passed
/// through.
pub fn parse_cron(expr: &str) -> Result<Schedule> {
    let expr = expr.trim();
    let normalized = match expr.split_whitespace().count() {
        5 => format!("0 {expr}"),
        6 | 7 => expr.to_string(),
        n => bail!("expected 5 cron fields, found {n}"),
    };
    Schedule::from_str(&normalized).with_context(|| format!("invalid cron expression: {expr}"))
}

/// When a job fires.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Once, after `delay`.
    Once { delay: Duration },
    /// Repeatedly, per the schedule, in the local timezone.
    Cron(Box<Schedule>),
}

impl Trigger {
    pub fn once_after(delay: Duration) -> Self {
        Self::Once { delay }
    }

    pub fn cron(expr: &str) -> Result<Self> {
        Ok(Self::Cron(Box::new(parse_cron(expr)?)))
    }
}

struct JobHandle {
    id: String,
    cancel: CancellationToken,
    thread: JoinHandle<()>,
}

/// A set of jobs, each running on its own thread.
#[derive(Default)]
pub struct Scheduler {
    jobs: Mutex<Vec<JobHandle>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job. The job receives the token that
    /// [`remove_all_jobs`](Self::remove_all_jobs) cancels.
    pub fn add_job<F>(&self, id: &str, trigger: Trigger, job: F) -> Result<()>
    where
        F: Fn(&CancellationToken) -> Result<()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let thread_cancel = cancel.clone();
        let job_id = id.to_string();

        let thread = std::thread::Builder::new()
            .name(format!("job-{id}"))
            .spawn(move || run_job(&job_id, trigger, &thread_cancel, job))
            .with_context(|| format!("Failed to spawn thread for job {id}"))?;

        info!(job = id, "Registered job");
        self.jobs.lock().push(JobHandle {
            id: id.to_string(),
            cancel,
            thread,
        });
        Ok(())
    }

    /// Ids of jobs whose threads are still running.
    pub fn job_ids(&self) -> Vec<String> {
        self.jobs
            .lock()
            .iter()
            .filter(|j| !j.thread.is_finished())
            .map(|j| j.id.clone())
            .collect()
    }

    /// Cancel every job and wait for its thread. An in-flight job run is
    /// not interrupted; its pass observes the cancelled token.
    pub fn remove_all_jobs(&self) {
        let jobs: Vec<JobHandle> = std::mem::take(&mut *self.jobs.lock());
        for job in &jobs {
            job.cancel.cancel();
        }
        for job in jobs {
            if job.thread.join().is_err() {
                warn!(job = %job.id, "Job thread panicked");
            }
            debug!(job = %job.id, "Removed job");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.remove_all_jobs();
    }
}

fn run_job<F>(id: &str, trigger: Trigger, cancel: &CancellationToken, job: F)
where
    F: Fn(&CancellationToken) -> Result<()>,
{
    match trigger {
        Trigger::Once { delay } => {
            if sleep_cancellable(delay, cancel) {
                execute(id, cancel, &job);
            }
        }
        Trigger::Cron(schedule) => loop {
            let Some(next) = schedule.upcoming(Local).next() else {
                info!(job = id, "Cron schedule has no upcoming fire time");
                break;
            };
            debug!(job = id, next = %next, "Next run");
            let wait = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);
            if !sleep_cancellable(wait, cancel) {
                break;
            }
            execute(id, cancel, &job);
            if cancel.is_cancelled() {
                break;
            }
        },
    }
    debug!(job = id, "Job thread exiting");
}

fn execute<F>(id: &str, cancel: &CancellationToken, job: &F)
where
    F: Fn(&CancellationToken) -> Result<()>,
{
    info!(job = id, "Running job");
    if let Err(e) = job(cancel) {
        error!(job = id, error = %format!("{e:#}"), "Job failed");
    }
}

/// Sleep for `duration` unless cancelled first. Returns `false` when
/// cancelled.
fn sleep_cancellable(duration: Duration, cancel: &CancellationToken) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}
