pub mod balanced;
pub mod config;
pub mod multipool;
pub mod planner;
pub mod suggest;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use sched_core::{BatchSearch, Snapshot};
use types::{BatchRequest, Outcome};

pub use balanced::{solve, Ranking};
pub use config::{CandidateCap, SearchConfig};
pub use multipool::solve_multi_pool;
pub use planner::Planner;
pub use suggest::{solve_with_fallback, solve_with_relaxation};

#[derive(Clone, Debug, Default)]
pub struct HeurPlanner {
    config: SearchConfig,
}

impl HeurPlanner {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

#[async_trait]
impl BatchSearch for HeurPlanner {
    async fn search(&self, snapshot: Arc<Snapshot>, req: BatchRequest) -> anyhow::Result<Outcome> {
        let config = self.config.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            Planner::new(&snapshot, &config).find_batches(&req)
        })
        .await??;
        Ok(outcome)
    }
}
