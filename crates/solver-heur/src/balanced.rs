use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::num::NonZeroUsize;

use itertools::Itertools;
use sched_core::scoring::balance_score;
use sched_core::{AvailabilityEntry, AvailabilityMap};
use tracing::debug;
use types::{Batch, PersonId, Solution};

use crate::config::{CandidateCap, SearchConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ranking {
    ScoreOnly,
    DistinctDaysFirst,
}

/// Top-scoring complete splits of `target` into `batches` groups, each on
/// its own slot of `availability`. Empty when no combination covers everyone.
pub fn solve(
    target: &BTreeSet<PersonId>,
    batches: NonZeroUsize,
    availability: &AvailabilityMap,
    config: &SearchConfig,
) -> Vec<Solution> {
    let k = batches.get();
    if target.is_empty() || availability.len() < k {
        return Vec::new();
    }

    let all: Vec<&AvailabilityEntry> = availability.entries().iter().collect();
    let candidates = if k > 1 {
        cap_candidates(all, config.candidate_cap, k)
    } else {
        all
    };

    let mut found: Vec<Solution> = candidates
        .iter()
        .copied()
        .combinations(k)
        .filter_map(|columns| place(target, &columns))
        .collect();
    debug!(
        batches = k,
        candidates = candidates.len(),
        accepted = found.len(),
        "combination search finished"
    );

    let ranking = if config.prefer_distinct_days {
        Ranking::DistinctDaysFirst
    } else {
        Ranking::ScoreOnly
    };
    rank(&mut found, ranking);
    found.truncate(config.top_n);
    found
}

/// Keeps the `limit` entries with the most free people, ties going to the
/// earlier entry. Survivors stay in their original order. The limit never
/// drops below `min_keep`.
pub(crate) fn cap_candidates<'a>(
    entries: Vec<&'a AvailabilityEntry>,
    cap: CandidateCap,
    min_keep: usize,
) -> Vec<&'a AvailabilityEntry> {
    let limit = match cap {
        CandidateCap::Capped(limit) => limit.max(min_keep),
        CandidateCap::Full => return entries,
    };
    if entries.len() <= limit {
        return entries;
    }
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(entries[i].free_people.len()));
    order.truncate(limit);
    order.sort_unstable();
    debug!(from = entries.len(), to = limit, "candidate slots truncated");
    order.into_iter().map(|i| entries[i]).collect()
}

/// Greedy balanced assignment of `target` onto `columns`, position `i`
/// being batch `i`. People with the fewest usable columns go first; each
/// joins the smallest batch it can, lowest index on ties. `None` unless
/// everyone is placed and no batch stays empty: a batch nobody attends is
/// not offered as a batch.
pub(crate) fn assign(
    target: &BTreeSet<PersonId>,
    columns: &[&AvailabilityEntry],
) -> Option<Vec<Vec<PersonId>>> {
    let mut options: Vec<(&PersonId, Vec<usize>)> = Vec::with_capacity(target.len());
    for person in target {
        let usable: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.free_people.contains(person))
            .map(|(i, _)| i)
            .collect();
        if usable.is_empty() {
            return None;
        }
        options.push((person, usable));
    }
    options.sort_by_key(|(_, usable)| usable.len());

    let mut groups: Vec<Vec<PersonId>> = vec![Vec::new(); columns.len()];
    for (person, usable) in options {
        let pos = usable
            .iter()
            .copied()
            .min_by_key(|&i| (groups[i].len(), i))?;
        groups[pos].push(person.clone());
    }
    if groups.iter().any(Vec::is_empty) {
        return None;
    }
    for g in &mut groups {
        g.sort();
    }
    Some(groups)
}

pub(crate) fn place(
    target: &BTreeSet<PersonId>,
    columns: &[&AvailabilityEntry],
) -> Option<Solution> {
    let groups = assign(target, columns)?;
    let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
    let days: HashSet<_> = columns.iter().map(|c| c.slot.day).collect();
    let batches = columns
        .iter()
        .zip(groups)
        .map(|(c, members)| Batch {
            slot: c.slot,
            members,
            free_rooms: c.free_rooms.iter().cloned().collect(),
        })
        .collect();
    Some(Solution {
        batches,
        score: balance_score(&sizes),
        distinct_days: days.len() == columns.len(),
    })
}

/// Stable, so equal keys keep enumeration order.
pub(crate) fn rank(solutions: &mut [Solution], ranking: Ranking) {
    solutions.sort_by(|a, b| {
        let tier = match ranking {
            Ranking::ScoreOnly => Ordering::Equal,
            Ranking::DistinctDaysFirst => b.distinct_days.cmp(&a.distinct_days),
        };
        tier.then(a.score.total_cmp(&b.score))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{avail, ids, nz, slot};
    use types::RoomId;

    fn members(s: &Solution) -> Vec<Vec<&str>> {
        s.batches
            .iter()
            .map(|b| b.members.iter().map(|p| p.0.as_str()).collect())
            .collect()
    }

    #[test]
    fn only_covering_combination_is_returned() {
        let map = avail(&[
            ("mon", "09:00-10:00", &["A", "B"], &["R1"]),
            ("mon", "10:00-11:00", &["C"], &["R2"]),
        ]);
        let out = solve(&ids(&["A", "B", "C"]), nz(2), &map, &SearchConfig::default());
        assert_eq!(out.len(), 1);
        assert_eq!(members(&out[0]), vec![vec!["A", "B"], vec!["C"]]);
        assert_eq!(out[0].batches[0].slot, slot("mon", "09:00-10:00"));
        assert_eq!(out[0].batches[1].free_rooms, vec![RoomId::from("R2")]);
        assert!(!out[0].distinct_days);
    }

    #[test]
    fn disjoint_halves_balance_perfectly() {
        let map = avail(&[
            ("mon", "09:00-10:00", &["A", "B"], &["R1"]),
            ("tue", "09:00-10:00", &["C", "D"], &["R1"]),
        ]);
        let out = solve(&ids(&["A", "B", "C", "D"]), nz(2), &map, &SearchConfig::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].score, 0.0);
        assert_eq!(out[0].sizes(), vec![2, 2]);
        assert!(out[0].distinct_days);
    }

    #[test]
    fn too_few_slots_yield_nothing() {
        let map = avail(&[("mon", "09:00-10:00", &["A", "B"], &["R1"])]);
        assert!(solve(&ids(&["A", "B"]), nz(2), &map, &SearchConfig::default()).is_empty());
    }

    #[test]
    fn empty_target_yields_nothing() {
        let map = avail(&[("mon", "09:00-10:00", &["A"], &["R1"])]);
        assert!(solve(&BTreeSet::new(), nz(1), &map, &SearchConfig::default()).is_empty());
    }

    #[test]
    fn person_free_nowhere_blocks_coverage() {
        let map = avail(&[
            ("mon", "09:00-10:00", &["A"], &["R1"]),
            ("mon", "10:00-11:00", &["B"], &["R1"]),
        ]);
        assert!(solve(&ids(&["A", "B", "Z"]), nz(2), &map, &SearchConfig::default()).is_empty());
    }

    #[test]
    fn batch_left_empty_is_rejected() {
        // both slots only hold A, so one batch has to stay empty
        let cols = avail(&[
            ("mon", "09:00-10:00", &["A"], &["R1"]),
            ("mon", "10:00-11:00", &["A"], &["R1"]),
        ]);
        let refs: Vec<_> = cols.entries().iter().collect();
        assert!(assign(&ids(&["A"]), &refs).is_none());
    }

    #[test]
    fn scarce_people_are_placed_first() {
        // C takes batch 1 first, A and B fill batch 0, D tops up batch 1.
        let map = avail(&[
            ("mon", "09:00-10:00", &["A", "B", "D"], &["R1"]),
            ("tue", "09:00-10:00", &["A", "B", "C", "D"], &["R1"]),
        ]);
        let out = solve(&ids(&["A", "B", "C", "D"]), nz(2), &map, &SearchConfig::default());
        assert_eq!(out[0].sizes(), vec![2, 2]);
        assert_eq!(members(&out[0]), vec![vec!["A", "B"], vec!["C", "D"]]);
    }

    #[test]
    fn distinct_days_rank_ahead_of_better_scores() {
        let map = avail(&[
            ("mon", "09:00-10:00", &["A", "B"], &["R1"]),
            ("mon", "10:00-11:00", &["C", "D"], &["R1"]),
            ("tue", "09:00-10:00", &["C", "D", "E"], &["R1"]),
        ]);
        let target = ids(&["A", "B", "C", "D", "E"]);
        let out = solve(&target, nz(2), &map, &SearchConfig::default());
        // mon09+mon10 cannot place E; mon09+tue09 and mon10+tue09 remain
        assert!(out[0].distinct_days);
        for w in out.windows(2) {
            if w[0].distinct_days == w[1].distinct_days {
                assert!(w[0].score <= w[1].score);
            } else {
                assert!(w[0].distinct_days);
            }
        }
    }

    #[test]
    fn score_only_ranking_ignores_days() {
        let map = avail(&[
            ("mon", "09:00-10:00", &["A", "B"], &["R1"]),
            ("mon", "10:00-11:00", &["C", "D"], &["R1"]),
            ("tue", "09:00-10:00", &["C", "D", "E", "F"], &["R1"]),
        ]);
        let target = ids(&["A", "B", "C", "D"]);
        let config = SearchConfig {
            prefer_distinct_days: false,
            ..SearchConfig::default()
        };
        let out = solve(&target, nz(2), &map, &config);
        assert_eq!(out[0].score, 0.0);
        assert!(!out[0].distinct_days);
        let mut prefer = solve(&target, nz(2), &map, &SearchConfig::default());
        assert!(prefer.remove(0).distinct_days);
    }

    #[test]
    fn top_n_caps_output() {
        let rows: Vec<(String, Vec<&str>)> = (8..16)
            .map(|h| (format!("{h}:00-{}:00", h + 1), vec!["A", "B", "C", "D"]))
            .collect();
        let entries = rows
            .iter()
            .map(|(t, people)| ("wed", t.as_str(), people.as_slice(), &["R1"][..]))
            .collect::<Vec<_>>();
        let map = avail(&entries);
        let config = SearchConfig {
            top_n: 3,
            ..SearchConfig::default()
        };
        assert_eq!(solve(&ids(&["A", "B", "C", "D"]), nz(2), &map, &config).len(), 3);
    }

    #[test]
    fn cap_keeps_most_populated_slots_in_order() {
        let map = avail(&[
            ("mon", "09:00-10:00", &["A"], &["R1"]),
            ("mon", "10:00-11:00", &["A", "B", "C"], &["R1"]),
            ("mon", "11:00-12:00", &["A", "B"], &["R1"]),
            ("mon", "12:00-13:00", &["A", "B"], &["R1"]),
        ]);
        let entries = || map.entries().iter().collect::<Vec<_>>();
        let kept: Vec<_> = cap_candidates(entries(), CandidateCap::Capped(2), 2)
            .into_iter()
            .map(|e| e.slot)
            .collect();
        assert_eq!(
            kept,
            vec![slot("mon", "10:00-11:00"), slot("mon", "11:00-12:00")]
        );
        assert_eq!(cap_candidates(entries(), CandidateCap::Full, 2).len(), 4);
        assert_eq!(cap_candidates(entries(), CandidateCap::Capped(1), 3).len(), 3);
    }

    #[test]
    fn capped_search_can_miss_solutions() {
        // The only covering pair uses the sparsest slot.
        let map = avail(&[
            ("mon", "09:00-10:00", &["A", "B"], &["R1"]),
            ("mon", "10:00-11:00", &["A", "B"], &["R1"]),
            ("mon", "11:00-12:00", &["A", "B"], &["R1"]),
            ("mon", "12:00-13:00", &["C"], &["R1"]),
        ]);
        let target = ids(&["A", "B", "C"]);
        let capped = SearchConfig {
            candidate_cap: CandidateCap::Capped(3),
            ..SearchConfig::default()
        };
        assert!(solve(&target, nz(2), &map, &capped).is_empty());
        let full = SearchConfig {
            candidate_cap: CandidateCap::Full,
            ..SearchConfig::default()
        };
        assert_eq!(solve(&target, nz(2), &map, &full).len(), 3);
    }

    #[test]
    fn repeated_solves_agree() {
        let map = avail(&[
            ("mon", "09:00-10:00", &["A", "B", "C"], &["R1"]),
            ("tue", "09:00-10:00", &["B", "C", "D"], &["R2"]),
            ("wed", "09:00-10:00", &["A", "D"], &["R3"]),
        ]);
        let target = ids(&["A", "B", "C", "D"]);
        let a = solve(&target, nz(2), &map, &SearchConfig::default());
        let b = solve(&target, nz(2), &map, &SearchConfig::default());
        assert_eq!(a, b);
    }
}
