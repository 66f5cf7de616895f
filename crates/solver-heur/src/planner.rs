use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use sched_core::{validate_batch_counts, InvalidRequest, Snapshot};
use tracing::{info, warn};
use types::{BatchRequest, MultiPoolOutcome, MultiPoolRequest, Outcome, PersonId, Slot};

use crate::config::SearchConfig;
use crate::multipool::solve_multi_pool;
use crate::suggest::{solve_with_fallback, solve_with_relaxation};

struct Prepared {
    requested: NonZeroUsize,
    target: BTreeSet<PersonId>,
    pool: Vec<Slot>,
    max: usize,
}

/// Resolves caller requests against one snapshot and runs the matching
/// search. Every request-level check happens here, before any search.
pub struct Planner<'a> {
    snapshot: &'a Snapshot,
    config: &'a SearchConfig,
}

impl<'a> Planner<'a> {
    pub fn new(snapshot: &'a Snapshot, config: &'a SearchConfig) -> Self {
        Self { snapshot, config }
    }

    /// Every check `find_batches` makes before searching, for callers that
    /// run the search later.
    pub fn validate(&self, req: &BatchRequest) -> Result<(), InvalidRequest> {
        self.prepare(req).map(|_| ())
    }

    fn prepare(&self, req: &BatchRequest) -> Result<Prepared, InvalidRequest> {
        validate_batch_counts(req.batches, req.max_batches)?;
        let requested =
            NonZeroUsize::new(req.batches as usize).ok_or(InvalidRequest::ZeroBatches)?;
        let target = self.snapshot.resolve_target(&req.target)?;
        let query = self.snapshot.slot_query(&req.filter)?;
        let pool = self.snapshot.list_slots(&query);
        if pool.is_empty() {
            return Err(InvalidRequest::EmptyPool);
        }
        let max = req
            .max_batches
            .map(|m| m as usize)
            .unwrap_or(self.config.max_batches);
        Ok(Prepared {
            requested,
            target,
            pool,
            max,
        })
    }

    /// A filter covering the whole schedulable week gets the plain
    /// more-batches fallback; a narrower one also gets relaxed-pool and
    /// per-day suggestions.
    pub fn find_batches(&self, req: &BatchRequest) -> Result<Outcome, InvalidRequest> {
        let Prepared {
            requested,
            target,
            pool,
            max,
        } = self.prepare(req)?;
        let narrowed = !self
            .snapshot
            .schedulable()
            .iter()
            .all(|s| pool.contains(s));

        info!(
            people = target.len(),
            requested = requested.get(),
            pool = pool.len(),
            narrowed,
            "finding batches"
        );
        let outcome = if narrowed {
            solve_with_relaxation(self.snapshot, &target, requested, &pool, max, self.config)
        } else {
            let availability = self.snapshot.availability(&target, &pool);
            solve_with_fallback(&target, requested, &availability, max, self.config)
        };
        Ok(outcome)
    }

    /// One pool per batch. When no tuple covers everyone, falls back to the
    /// single-pool search over the schedulable week with the same count.
    pub fn find_batches_multi_pool(
        &self,
        req: &MultiPoolRequest,
    ) -> Result<MultiPoolOutcome, InvalidRequest> {
        if req.pools.is_empty() {
            return Err(InvalidRequest::NoPools);
        }
        let target = self.snapshot.resolve_target(&req.target)?;
        let mut pools: Vec<Vec<Slot>> = Vec::with_capacity(req.pools.len());
        for (i, filter) in req.pools.iter().enumerate() {
            let query = self.snapshot.slot_query(filter)?;
            let pool = self.snapshot.list_slots(&query);
            if pool.is_empty() {
                return Err(InvalidRequest::EmptyBatchPool(i));
            }
            pools.push(pool);
        }

        info!(people = target.len(), batches = pools.len(), "finding multi-pool batches");
        let unsatisfiable_batch = match solve_multi_pool(
            &target,
            &pools,
            self.snapshot.busy(),
            self.snapshot.rooms(),
            self.config,
        ) {
            Ok(solutions) if !solutions.is_empty() => {
                return Ok(MultiPoolOutcome::Planned { solutions });
            }
            Ok(_) => None,
            Err(e) => {
                warn!(index = e.index, "batch pool unsatisfiable");
                Some(e.index)
            }
        };

        let requested = NonZeroUsize::new(pools.len()).ok_or(InvalidRequest::NoPools)?;
        let full = self.snapshot.schedulable();
        let availability = self.snapshot.availability(&target, full);
        let outcome = solve_with_fallback(
            &target,
            requested,
            &availability,
            self.config.max_batches,
            self.config,
        );
        Ok(MultiPoolOutcome::Fallback {
            unsatisfiable_batch,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::week;
    use types::{DayOfWeek, SlotFilter, TargetSpec};

    fn request(batches: u32, days: &[&str]) -> BatchRequest {
        BatchRequest {
            target: TargetSpec::Text("A B C".into()),
            batches,
            filter: SlotFilter {
                days: days.iter().map(|d| d.to_string()).collect(),
                ..SlotFilter::default()
            },
            max_batches: None,
        }
    }

    fn filter(day: &str, between: &str) -> SlotFilter {
        SlotFilter {
            days: vec![day.into()],
            between: Some(between.into()),
            include_excluded: false,
        }
    }

    #[test]
    fn rejects_bad_requests_before_searching() {
        let snap = week();
        let config = SearchConfig::default();
        let planner = Planner::new(&snap, &config);
        assert_eq!(
            planner.find_batches(&request(0, &[])),
            Err(InvalidRequest::ZeroBatches)
        );
        assert_eq!(
            planner.find_batches(&request(2, &["fri"])),
            Err(InvalidRequest::UnknownDay("fri".into()))
        );
        let mut req = request(3, &[]);
        req.max_batches = Some(2);
        assert_eq!(
            planner.find_batches(&req),
            Err(InvalidRequest::MaxBelowRequest {
                requested: 3,
                max: 2
            })
        );
        let mut req = request(2, &[]);
        req.filter.between = Some("18:00-19:00".into());
        assert_eq!(planner.find_batches(&req), Err(InvalidRequest::EmptyPool));
        let mut req = request(2, &[]);
        req.target = TargetSpec::Text("   ".into());
        assert_eq!(planner.find_batches(&req), Err(InvalidRequest::EmptyTarget));
    }

    #[test]
    fn validate_matches_search_checks() {
        let snap = week();
        let config = SearchConfig::default();
        let planner = Planner::new(&snap, &config);
        assert_eq!(planner.validate(&request(2, &[])), Ok(()));
        assert_eq!(
            planner.validate(&request(2, &["fri"])),
            Err(InvalidRequest::UnknownDay("fri".into()))
        );
        let mut req = request(2, &[]);
        req.filter.between = Some("noon".into());
        assert_eq!(
            planner.validate(&req),
            Err(InvalidRequest::BadTimeWindow("noon".into()))
        );
        req.filter.between = Some("18:00-19:00".into());
        assert_eq!(planner.validate(&req), Err(InvalidRequest::EmptyPool));
    }

    #[test]
    fn whole_week_request_succeeds() {
        let snap = week();
        let config = SearchConfig::default();
        let out = Planner::new(&snap, &config)
            .find_batches(&request(2, &[]))
            .unwrap();
        match out {
            Outcome::Success {
                batch_count,
                solutions,
            } => {
                assert_eq!(batch_count, 2);
                assert!(solutions.iter().all(|s| s.batches.len() == 2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn narrowed_request_falls_back_to_suggestions() {
        let snap = week();
        let config = SearchConfig::default();
        let out = Planner::new(&snap, &config)
            .find_batches(&request(2, &["mon"]))
            .unwrap();
        match out {
            Outcome::Suggested { suggestions } => {
                assert!(suggestions.relaxed_pool.is_some());
                assert_eq!(suggestions.feasible_days, vec![DayOfWeek::Tue, DayOfWeek::Wed]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn multi_pool_plans_per_batch() {
        let snap = week();
        let config = SearchConfig::default();
        let req = MultiPoolRequest {
            target: TargetSpec::Text("A,B,C".into()),
            pools: vec![filter("tue", "09:00-10:00"), filter("wed", "10:00-11:00")],
        };
        let out = Planner::new(&snap, &config)
            .find_batches_multi_pool(&req)
            .unwrap();
        match out {
            MultiPoolOutcome::Planned { solutions } => {
                assert_eq!(solutions.len(), 1);
                assert_eq!(solutions[0].sizes(), vec![2, 1]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn multi_pool_without_cover_falls_back_to_whole_week() {
        let snap = week();
        let config = SearchConfig::default();
        let req = MultiPoolRequest {
            target: TargetSpec::Text("A B C".into()),
            pools: vec![filter("mon", "09:00-10:00"), filter("mon", "09:00-10:00")],
        };
        let out = Planner::new(&snap, &config)
            .find_batches_multi_pool(&req)
            .unwrap();
        match out {
            MultiPoolOutcome::Fallback {
                unsatisfiable_batch,
                outcome,
            } => {
                assert_eq!(unsatisfiable_batch, None);
                assert!(matches!(outcome, Outcome::Success { batch_count: 2, .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn multi_pool_rejects_missing_or_empty_pools() {
        let snap = week();
        let config = SearchConfig::default();
        let planner = Planner::new(&snap, &config);
        let req = MultiPoolRequest {
            target: TargetSpec::Text("A".into()),
            pools: vec![],
        };
        assert_eq!(planner.find_batches_multi_pool(&req), Err(InvalidRequest::NoPools));
        let req = MultiPoolRequest {
            target: TargetSpec::Text("A".into()),
            pools: vec![filter("tue", "09:00-10:00"), filter("tue", "15:00-16:00")],
        };
        assert_eq!(
            planner.find_batches_multi_pool(&req),
            Err(InvalidRequest::EmptyBatchPool(1))
        );
    }
}
