use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use sched_core::{BatchSearch, Snapshot};
use tracing::{debug, error, info};
use types::{BatchRequest, Outcome};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Done { outcome: Outcome },
    Failed { message: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Done { .. } | JobStatus::Failed { .. })
    }
}

/// Finished jobs kept for polling before the oldest are dropped.
pub const DEFAULT_RETAINED: usize = 1024;

#[derive(Default)]
struct Registry {
    statuses: HashMap<String, JobStatus>,
    finished: VecDeque<String>,
}

impl Registry {
    fn finish(&mut self, id: String, status: JobStatus, retained: usize) {
        self.statuses.insert(id.clone(), status);
        self.finished.push_back(id);
        while self.finished.len() > retained {
            if let Some(old) = self.finished.pop_front() {
                self.statuses.remove(&old);
                debug!(job = %old, "evicted finished job");
            }
        }
    }
}

/// Background batch searches. Each job runs against the snapshot handed to
/// [`InMemJobs::enqueue`], so a later reload never changes a running job.
/// Only the most recent `retained` finished jobs stay readable.
pub struct InMemJobs<S: BatchSearch> {
    inner: Arc<RwLock<Registry>>,
    search: Arc<S>,
    retained: usize,
}

impl<S: BatchSearch> Clone for InMemJobs<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            search: self.search.clone(),
            retained: self.retained,
        }
    }
}

impl<S: BatchSearch> InMemJobs<S> {
    pub fn new(search: Arc<S>) -> Self {
        Self::with_retention(search, DEFAULT_RETAINED)
    }

    pub fn with_retention(search: Arc<S>, retained: usize) -> Self {
        Self {
            inner: Default::default(),
            search,
            retained: retained.max(1),
        }
    }

    pub fn enqueue(&self, snapshot: Arc<Snapshot>, req: BatchRequest) -> JobId {
        let id = Uuid::new_v4().to_string();
        self.inner
            .write()
            .statuses
            .insert(id.clone(), JobStatus::Queued);

        let map = self.inner.clone();
        let search = self.search.clone();
        let retained = self.retained;
        let id_for_task = id.clone();

        tokio::spawn(async move {
            map.write()
                .statuses
                .insert(id_for_task.clone(), JobStatus::Running);
            let status = match search.search(snapshot, req).await {
                Ok(outcome) => {
                    info!(job = %id_for_task, "job finished");
                    JobStatus::Done { outcome }
                }
                Err(e) => {
                    error!(job = %id_for_task, ?e, "job failed");
                    JobStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };
            map.write().finish(id_for_task, status, retained);
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().statuses.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use types::{SlotFilter, TargetSpec};

    struct Fixed(Result<Outcome, String>);

    #[async_trait]
    impl BatchSearch for Fixed {
        async fn search(&self, _: Arc<Snapshot>, _: BatchRequest) -> anyhow::Result<Outcome> {
            match &self.0 {
                Ok(o) => Ok(o.clone()),
                Err(msg) => Err(anyhow::anyhow!(msg.clone())),
            }
        }
    }

    fn snapshot() -> Arc<Snapshot> {
        let entry = types::TimetableEntry {
            slot: "09:00-10:00"
                .parse::<types::TimeRange>()
                .map(|time| types::Slot::new(types::DayOfWeek::Mon, time))
                .unwrap(),
            class: types::ClassRef {
                subject: "MATH".into(),
                division: "A".into(),
            },
            room: "R1".into(),
        };
        Arc::new(Snapshot::build(Vec::new(), vec![entry], None, &BTreeSet::new()).unwrap())
    }

    fn request() -> BatchRequest {
        BatchRequest {
            target: TargetSpec::Text("x".into()),
            batches: 1,
            filter: SlotFilter::default(),
            max_batches: None,
        }
    }

    async fn settle<S: BatchSearch>(jobs: &InMemJobs<S>, id: &JobId) -> JobStatus {
        for _ in 0..1000 {
            if let Some(st) = jobs.get(&id.0) {
                if st.is_finished() {
                    return st;
                }
            }
            tokio::task::yield_now().await;
        }
        panic!("job {} never finished", id.0);
    }

    #[tokio::test]
    async fn finished_job_carries_outcome() {
        let jobs = InMemJobs::new(Arc::new(Fixed(Ok(Outcome::NoSolution))));
        let id = jobs.enqueue(snapshot(), request());
        match settle(&jobs, &id).await {
            JobStatus::Done { outcome } => assert_eq!(outcome, Outcome::NoSolution),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_error_becomes_failed_status() {
        let jobs = InMemJobs::new(Arc::new(Fixed(Err("boom".into()))));
        let id = jobs.enqueue(snapshot(), request());
        match settle(&jobs, &id).await {
            JobStatus::Failed { message } => assert_eq!(message, "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn oldest_finished_job_is_evicted() {
        let jobs = InMemJobs::with_retention(Arc::new(Fixed(Ok(Outcome::NoSolution))), 1);
        let first = jobs.enqueue(snapshot(), request());
        settle(&jobs, &first).await;
        let second = jobs.enqueue(snapshot(), request());
        settle(&jobs, &second).await;
        assert!(jobs.get(&first.0).is_none());
        assert!(jobs.get(&second.0).is_some());
    }

    #[test]
    fn unknown_id_is_none() {
        let jobs = InMemJobs::new(Arc::new(Fixed(Ok(Outcome::NoSolution))));
        assert!(jobs.get("nope").is_none());
    }

    #[test]
    fn status_is_tagged() {
        let v = serde_json::to_value(JobStatus::Failed {
            message: "x".into(),
        })
        .unwrap();
        assert_eq!(v["status"], "failed");
    }
}
