use std::collections::BTreeSet;

use types::{DayOfWeek, Slot, SlotFilter, TimeRange};

use crate::error::InvalidRequest;

/// A validated [`SlotFilter`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotQuery {
    /// Empty means every day.
    pub days: BTreeSet<DayOfWeek>,
    pub window: Option<TimeRange>,
    pub include_excluded: bool,
}

impl SlotQuery {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn on_days(days: impl IntoIterator<Item = DayOfWeek>) -> Self {
        Self {
            days: days.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Parses a raw filter, rejecting days that never appear in `known_days`.
    pub fn parse(
        filter: &SlotFilter,
        known_days: &BTreeSet<DayOfWeek>,
    ) -> Result<Self, InvalidRequest> {
        let mut days = BTreeSet::new();
        for raw in &filter.days {
            let day: DayOfWeek = raw
                .parse()
                .map_err(|_| InvalidRequest::UnknownDay(raw.clone()))?;
            if !known_days.contains(&day) {
                return Err(InvalidRequest::UnknownDay(raw.clone()));
            }
            days.insert(day);
        }
        let window = match filter.between.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<TimeRange>()
                    .map_err(|_| InvalidRequest::BadTimeWindow(raw.to_string()))?,
            ),
        };
        Ok(Self {
            days,
            window,
            include_excluded: filter.include_excluded,
        })
    }

    pub fn matches(&self, slot: &Slot) -> bool {
        (self.days.is_empty() || self.days.contains(&slot.day))
            && self.window.map_or(true, |w| w.contains(&slot.time))
    }
}
