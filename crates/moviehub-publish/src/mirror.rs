//! Replication of local artifacts to the remote store.
//!
//! Every replication reads the artifact's local file at the moment it is
//! pushed, and replications run one at a time, so the remote copy of an
//! artifact can only move forward to the latest local content even when
//! publishes finish out of order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{info, warn};
use uuid::Uuid;

use moviehub_remote::{upsert_blob, CommitMessages, RemoteStore, UpsertOutcome};

use crate::site::SiteLayout;

/// Finished jobs beyond this many are forgotten, oldest first.
const MAX_RETAINED_JOBS: usize = 1024;

/// One site file to replicate and how to describe the commit.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Site-relative path, identical locally and remotely.
    pub path: String,
    pub messages: CommitMessages,
}

impl Artifact {
    pub fn new(path: impl Into<String>, messages: CommitMessages) -> Self {
        Self {
            path: path.into(),
            messages,
        }
    }
}

/// Per-artifact results of one replication.
#[derive(Debug, Default)]
pub struct MirrorReport {
    pub outcomes: Vec<(String, Result<UpsertOutcome, String>)>,
}

impl MirrorReport {
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|(_, r)| r.is_ok())
    }

    /// Human-readable description of every failed artifact.
    pub fn warnings(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|(path, r)| {
                r.as_ref()
                    .err()
                    .map(|e| format!("remote mirror of {} failed: {}", path, e))
            })
            .collect()
    }
}

/// Lifecycle of a deferred replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorState {
    Pending,
    Succeeded,
    Failed,
}

/// A tracked background replication.
#[derive(Debug, Clone, Serialize)]
pub struct MirrorJob {
    pub id: Uuid,
    pub title: String,
    pub state: MirrorState,
    pub artifacts: Vec<String>,
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Pushes site artifacts to the remote store and tracks deferred pushes.
pub struct Mirror {
    store: Arc<dyn RemoteStore>,
    layout: SiteLayout,
    timeout: Duration,
    gate: tokio::sync::Mutex<()>,
    jobs: Mutex<HashMap<Uuid, MirrorJob>>,
    finished: Notify,
}

impl Mirror {
    pub fn new(store: Arc<dyn RemoteStore>, layout: SiteLayout, timeout: Duration) -> Self {
        Self {
            store,
            layout,
            timeout,
            gate: tokio::sync::Mutex::new(()),
            jobs: Mutex::new(HashMap::new()),
            finished: Notify::new(),
        }
    }

    /// Replicate `artifacts` now and report per-artifact outcomes.
    ///
    /// A failure on one artifact does not stop the others.
    pub async fn replicate(&self, artifacts: &[Artifact]) -> MirrorReport {
        let _turn = self.gate.lock().await;
        let mut report = MirrorReport::default();

        for artifact in artifacts {
            let result = self.push(artifact).await;
            if let Err(e) = &result {
                warn!(store = self.store.name(), path = %artifact.path, error = %e, "Remote mirror failed");
            }
            report.outcomes.push((artifact.path.clone(), result));
        }
        report
    }

    async fn push(&self, artifact: &Artifact) -> Result<UpsertOutcome, String> {
        let local = self.layout.local(&artifact.path);
        let content = tokio::fs::read_to_string(&local)
            .await
            .map_err(|e| format!("cannot read {}: {}", local.display(), e))?;
        upsert_blob(
            self.store.as_ref(),
            &artifact.path,
            &content,
            &artifact.messages,
            self.timeout,
        )
        .await
        .map_err(|e| e.to_string())
    }

    /// Replicate in a background task and return the job id to poll.
    pub fn spawn(self: &Arc<Self>, title: &str, artifacts: Vec<Artifact>) -> Uuid {
        let job = MirrorJob {
            id: Uuid::new_v4(),
            title: title.to_string(),
            state: MirrorState::Pending,
            artifacts: artifacts.iter().map(|a| a.path.clone()).collect(),
            warnings: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
        };
        let id = job.id;
        self.jobs_guard().insert(id, job);

        let mirror = Arc::clone(self);
        tokio::spawn(async move {
            let report = mirror.replicate(&artifacts).await;
            mirror.finish(id, report);
        });
        id
    }

    fn finish(&self, id: Uuid, report: MirrorReport) {
        let state = if report.succeeded() {
            MirrorState::Succeeded
        } else {
            MirrorState::Failed
        };
        {
            let mut jobs = self.jobs_guard();
            if let Some(job) = jobs.get_mut(&id) {
                job.state = state;
                job.warnings = report.warnings();
                job.finished_at = Some(Utc::now());
                info!(job_id = %id, title = %job.title, state = ?state, "Deferred mirror finished");
            }
            prune(&mut jobs);
        }
        self.finished.notify_waiters();
    }

    pub fn job(&self, id: Uuid) -> Option<MirrorJob> {
        self.jobs_guard().get(&id).cloned()
    }

    /// All retained jobs, newest first.
    pub fn jobs(&self) -> Vec<MirrorJob> {
        let mut jobs: Vec<MirrorJob> = self.jobs_guard().values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Wait until job `id` leaves `Pending`. Returns `None` for unknown ids.
    pub async fn wait(&self, id: Uuid) -> Option<MirrorJob> {
        loop {
            let notified = self.finished.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.job(id) {
                None => return None,
                Some(job) if job.state != MirrorState::Pending => return Some(job),
                Some(_) => notified.await,
            }
        }
    }

    fn jobs_guard(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, MirrorJob>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn prune(jobs: &mut HashMap<Uuid, MirrorJob>) {
    if jobs.len() <= MAX_RETAINED_JOBS {
        return;
    }
    let mut finished: Vec<(DateTime<Utc>, Uuid)> = jobs
        .values()
        .filter(|j| j.state != MirrorState::Pending)
        .map(|j| (j.created_at, j.id))
        .collect();
    finished.sort();
    let excess = jobs.len() - MAX_RETAINED_JOBS;
    for (_, id) in finished.into_iter().take(excess) {
        jobs.remove(&id);
    }
}
