use std::collections::{BTreeSet, HashSet};

use itertools::Itertools;
use sched_core::{
    map_availability, AvailabilityEntry, BusySetIndex, RoomOccupancy, UnsatisfiableBatch,
};
use tracing::debug;
use types::{PersonId, Slot, Solution};

use crate::balanced::{cap_candidates, place, rank, Ranking};
use crate::config::SearchConfig;

/// Like [`crate::solve`], but batch `i` must sit in a slot drawn from
/// `pools[i]`. Tuples come from the Cartesian product of the pools, skip
/// any slot used twice, and are ranked by score alone.
pub fn solve_multi_pool(
    target: &BTreeSet<PersonId>,
    pools: &[Vec<Slot>],
    busy: &BusySetIndex,
    rooms: &RoomOccupancy,
    config: &SearchConfig,
) -> Result<Vec<Solution>, UnsatisfiableBatch> {
    if target.is_empty() || pools.is_empty() {
        return Ok(Vec::new());
    }

    let mut seen = HashSet::new();
    let union: Vec<Slot> = pools
        .iter()
        .flatten()
        .filter(|s| seen.insert(**s))
        .copied()
        .collect();
    let availability = map_availability(target, &union, busy, rooms);

    let mut trimmed: Vec<Vec<&AvailabilityEntry>> = Vec::with_capacity(pools.len());
    for (index, pool) in pools.iter().enumerate() {
        let wanted: HashSet<&Slot> = pool.iter().collect();
        let feasible: Vec<&AvailabilityEntry> = availability
            .entries()
            .iter()
            .filter(|e| wanted.contains(&e.slot))
            .collect();
        if feasible.is_empty() {
            debug!(index, "batch pool has no feasible slot");
            return Err(UnsatisfiableBatch { index });
        }
        trimmed.push(cap_candidates(feasible, config.candidate_cap, 1));
    }

    let mut found: Vec<Solution> = trimmed
        .iter()
        .map(|pool| pool.iter().copied())
        .multi_cartesian_product()
        .filter(|tuple| {
            let mut used = HashSet::new();
            tuple.iter().all(|e| used.insert(e.slot))
        })
        .filter_map(|tuple| place(target, &tuple))
        .collect();
    debug!(
        batches = pools.len(),
        accepted = found.len(),
        "multi-pool search finished"
    );

    rank(&mut found, Ranking::ScoreOnly);
    found.truncate(config.top_n);
    Ok(found)
}
