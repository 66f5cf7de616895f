use std::sync::Arc;

use jobs::InMemJobs;
use parking_lot::RwLock;
use sched_core::Snapshot;
use solver_heur::HeurPlanner;
use tracing::info;

use crate::config::Settings;
use crate::dataset;

#[derive(Clone)]
pub struct AppState {
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
    pub planner: Arc<HeurPlanner>,
    pub jobs: Arc<InMemJobs<HeurPlanner>>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings, snapshot: Snapshot) -> Self {
        let planner = Arc::new(HeurPlanner::new(settings.search.clone()));
        let jobs = InMemJobs::new(planner.clone());
        Self {
            snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
            planner,
            jobs: Arc::new(jobs),
            settings: Arc::new(settings),
        }
    }

    pub fn load(settings: Settings) -> anyhow::Result<Self> {
        let snapshot = dataset::load(&settings)?;
        Ok(Self::new(settings, snapshot))
    }

    /// The currently published snapshot. Holders keep it alive across a reload.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }

    /// Rebuilds from the configured files. The published snapshot is only
    /// replaced when the new one builds cleanly.
    pub async fn reload(&self) -> anyhow::Result<Arc<Snapshot>> {
        let settings = self.settings.clone();
        let fresh = tokio::task::spawn_blocking(move || dataset::load(&settings)).await??;
        let fresh = Arc::new(fresh);
        *self.snapshot.write() = fresh.clone();
        info!(
            people = fresh.people_count(),
            slots = fresh.universe().len(),
            "snapshot reloaded"
        );
        Ok(fresh)
    }
}
