use std::collections::{BTreeSet, HashSet};
use std::num::NonZeroUsize;

use sched_core::{AvailabilityMap, Snapshot};
use tracing::info;
use types::{MoreBatches, Outcome, PersonId, Slot, Suggestions};

use crate::balanced::solve;
use crate::config::SearchConfig;

/// Exact request first, then the smallest larger batch count up to
/// `max_batches` that has a solution.
pub fn solve_with_fallback(
    target: &BTreeSet<PersonId>,
    requested: NonZeroUsize,
    availability: &AvailabilityMap,
    max_batches: usize,
    config: &SearchConfig,
) -> Outcome {
    let solutions = solve(target, requested, availability, config);
    if !solutions.is_empty() {
        return Outcome::Success {
            batch_count: requested.get(),
            solutions,
        };
    }
    match more_batches(target, requested, availability, max_batches, config) {
        Some(MoreBatches {
            batch_count,
            solutions,
        }) => Outcome::SuggestedMoreBatches {
            batch_count,
            solutions,
        },
        None => Outcome::NoSolution,
    }
}

/// For a user-narrowed `pool`: on failure also tries the same batch count
/// over the whole schedulable week and each day not already covered by the
/// pool, alongside the larger-batch-count search.
pub fn solve_with_relaxation(
    snapshot: &Snapshot,
    target: &BTreeSet<PersonId>,
    requested: NonZeroUsize,
    pool: &[Slot],
    max_batches: usize,
    config: &SearchConfig,
) -> Outcome {
    let narrowed = snapshot.availability(target, pool);
    let solutions = solve(target, requested, &narrowed, config);
    if !solutions.is_empty() {
        return Outcome::Success {
            batch_count: requested.get(),
            solutions,
        };
    }

    let tried: HashSet<&Slot> = pool.iter().collect();
    let mut suggestions = Suggestions {
        more_batches: more_batches(target, requested, &narrowed, max_batches, config),
        ..Suggestions::default()
    };

    let full = snapshot.schedulable();
    if !full.iter().all(|s| tried.contains(s)) {
        let relaxed = solve(target, requested, &snapshot.availability(target, full), config);
        if !relaxed.is_empty() {
            info!(solutions = relaxed.len(), "relaxed pool is feasible");
            suggestions.relaxed_pool = Some(relaxed);
        }
    }

    for &day in snapshot.days() {
        let day_pool = snapshot.day_slots(day);
        if day_pool.is_empty() || day_pool.iter().all(|s| tried.contains(s)) {
            continue;
        }
        let map = snapshot.availability(target, &day_pool);
        if !solve(target, requested, &map, config).is_empty() {
            suggestions.feasible_days.push(day);
        }
    }
    if !suggestions.feasible_days.is_empty() {
        info!(days = ?suggestions.feasible_days, "single days can host the request");
    }

    if suggestions.is_empty() {
        Outcome::NoSolution
    } else {
        Outcome::Suggested { suggestions }
    }
}

fn more_batches(
    target: &BTreeSet<PersonId>,
    requested: NonZeroUsize,
    availability: &AvailabilityMap,
    max_batches: usize,
    config: &SearchConfig,
) -> Option<MoreBatches> {
    let mut count = requested;
    while let Some(next) = count.checked_add(1) {
        count = next;
        let b = count.get();
        if b > max_batches || b > availability.len() || b > target.len() {
            break;
        }
        let solutions = solve(target, count, availability, config);
        if !solutions.is_empty() {
            info!(requested = requested.get(), found = b, "feasible with more batches");
            return Some(MoreBatches {
                batch_count: b,
                solutions,
            });
        }
    }
    None
}
