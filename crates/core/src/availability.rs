use std::collections::{BTreeSet, HashSet};

use types::{PersonId, RoomId, Slot};

use crate::index::{BusySetIndex, RoomOccupancy};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailabilityEntry {
    pub slot: Slot,
    pub free_people: BTreeSet<PersonId>,
    pub free_rooms: BTreeSet<RoomId>,
}

/// Per-request view of the slots that can host at least one target person.
///
/// Entries keep the enumeration order of the pool they were built from, and
/// never carry an empty person or room set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AvailabilityMap {
    entries: Vec<AvailabilityEntry>,
}

impl AvailabilityMap {
    /// Drops entries with no free people or rooms, and repeated slots.
    pub fn from_entries(entries: impl IntoIterator<Item = AvailabilityEntry>) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|e| !e.free_people.is_empty() && !e.free_rooms.is_empty())
            .filter(|e| seen.insert(e.slot))
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[AvailabilityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, slot: &Slot) -> Option<&AvailabilityEntry> {
        self.entries.iter().find(|e| &e.slot == slot)
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.entries.iter().map(|e| &e.slot)
    }
}

pub fn map_availability(
    target: &BTreeSet<PersonId>,
    pool: &[Slot],
    busy: &BusySetIndex,
    rooms: &RoomOccupancy,
) -> AvailabilityMap {
    let entries = pool.iter().filter_map(|slot| {
        let free_rooms = rooms.free_at(slot);
        if free_rooms.is_empty() {
            return None;
        }
        let free_people: BTreeSet<PersonId> = target
            .iter()
            .filter(|p| !busy.is_busy(p, slot))
            .cloned()
            .collect();
        if free_people.is_empty() {
            return None;
        }
        Some(AvailabilityEntry {
            slot: *slot,
            free_people,
            free_rooms: free_rooms.clone(),
        })
    });
    AvailabilityMap::from_entries(entries)
}
