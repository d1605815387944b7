//! In-process job registry.
//!
//! The single source of truth polled by the status endpoint and mutated by
//! the pipeline executing each job. One pipeline execution owns one job
//! end-to-end; the lock only guards against concurrent readers observing a
//! partially written record.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use truthsync_core::{Error, Job, JobState, Result};

/// Process-wide mapping from job identifier to job state.
///
/// Explicitly owned and injected into request handlers; created at process
/// start and retained until restart.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Job>> {
        // A poisoned lock only means a panic elsewhere; the map itself is
        // still coherent because writers never leave partial records.
        match self.jobs.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Job>> {
        match self.jobs.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Insert a new job in state `Accepted`.
    ///
    /// Job ids are generated by the system itself, so a duplicate is a
    /// programming bug, not a user-facing condition.
    pub fn create(&self, job_id: &str) -> Result<()> {
        let mut jobs = self.write();
        if jobs.contains_key(job_id) {
            return Err(Error::Job(format!("duplicate job id: {}", job_id)));
        }
        jobs.insert(job_id.to_string(), Job::new(job_id));
        debug!(
            subsystem = "jobs",
            component = "registry",
            op = "create",
            job_id,
            "Job registered"
        );
        Ok(())
    }

    /// Atomically advance a job's state, progress, and message.
    ///
    /// Transitions are strictly forward-moving; `Failed` is reachable from
    /// any non-terminal state; terminal jobs reject every transition.
    /// Progress never decreases.
    pub fn transition(
        &self,
        job_id: &str,
        new_state: JobState,
        progress: f64,
        message: impl Into<String>,
    ) -> Result<()> {
        let mut jobs = self.write();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;

        if job.state.is_terminal() {
            return Err(Error::Job(format!(
                "invalid transition for {}: {} is terminal",
                job_id,
                job.state.name()
            )));
        }
        let backward = !matches!(new_state, JobState::Failed { .. })
            && new_state.rank() <= job.state.rank();
        if backward {
            return Err(Error::Job(format!(
                "invalid transition for {}: {} -> {}",
                job_id,
                job.state.name(),
                new_state.name()
            )));
        }

        job.state = new_state;
        job.progress = job.progress.max(progress.clamp(0.0, 100.0));
        job.message = message.into();
        job.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Update the informational progress estimate without changing state.
    pub fn update_progress(
        &self,
        job_id: &str,
        progress: f64,
        message: impl Into<String>,
    ) -> Result<()> {
        let mut jobs = self.write();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;

        if job.state.is_terminal() {
            return Err(Error::Job(format!(
                "cannot update progress for terminal job {}",
                job_id
            )));
        }

        job.progress = job.progress.max(progress.clamp(0.0, 100.0));
        job.message = message.into();
        job.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Append an observed fragment to the job's partial text and bump the
    /// progress estimate (the original calibration assumes ~1000 chars).
    pub fn append_fragment(&self, job_id: &str, fragment: &str) -> Result<()> {
        let mut jobs = self.write();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;

        if job.state.is_terminal() {
            return Err(Error::Job(format!(
                "cannot append to terminal job {}",
                job_id
            )));
        }

        job.partial_text.push_str(fragment);
        let chars = job.partial_text.chars().count();
        let estimate = (50.0 + chars as f64 / 20.0).min(95.0);
        job.progress = job.progress.max(estimate);
        job.message = format!("Generating article... ({} chars)", chars);
        job.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Move a job to `Failed` with the given error, from any non-terminal
    /// state. Progress is left where it was.
    pub fn fail(&self, job_id: &str, error: impl Into<String>) -> Result<()> {
        let error = error.into();
        let mut jobs = self.write();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;

        if job.state.is_terminal() {
            return Err(Error::Job(format!(
                "invalid transition for {}: {} is terminal",
                job_id,
                job.state.name()
            )));
        }

        job.message = error.clone();
        job.state = JobState::Failed { error };
        job.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Read-only snapshot of a job; never blocks on in-flight mutation
    /// beyond the lock itself.
    pub fn get(&self, job_id: &str) -> Option<Job> {
        self.read().get(job_id).cloned()
    }

    /// Number of tracked jobs.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
