pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_CANDIDATE_CAP: usize = 12;
pub const DEFAULT_MAX_BATCHES: usize = 8;

/// Ceiling on the slots fed into combination search. `Capped` keeps only the
/// slots with the most free people, so some solutions become unreachable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateCap {
    Full,
    Capped(usize),
}

impl CandidateCap {
    /// `0` means no ceiling.
    pub fn from_limit(limit: usize) -> Self {
        if limit == 0 {
            CandidateCap::Full
        } else {
            CandidateCap::Capped(limit)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    pub top_n: usize,
    pub candidate_cap: CandidateCap,
    /// Rank combinations on distinct days ahead of ones that reuse a day.
    /// Only the single-pool solver honours this.
    pub prefer_distinct_days: bool,
    /// Upper bound for the "more batches" suggestion search.
    pub max_batches: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            candidate_cap: CandidateCap::Capped(DEFAULT_CANDIDATE_CAP),
            prefer_distinct_days: true,
            max_batches: DEFAULT_MAX_BATCHES,
        }
    }
}
