use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use sched_core::{AvailabilityEntry, AvailabilityMap, Snapshot};
use types::{ClassRef, Person, PersonId, RoomId, Slot, TimetableEntry};

pub fn slot(day: &str, time: &str) -> Slot {
    Slot::new(day.parse().unwrap(), time.parse().unwrap())
}

pub fn ids(names: &[&str]) -> BTreeSet<PersonId> {
    names.iter().map(|n| PersonId::from(*n)).collect()
}

pub fn nz(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

/// `(day, time, free people, free rooms)` rows, in enumeration order.
pub fn avail(rows: &[(&str, &str, &[&str], &[&str])]) -> AvailabilityMap {
    AvailabilityMap::from_entries(rows.iter().map(|(day, time, people, rooms)| {
        AvailabilityEntry {
            slot: slot(day, time),
            free_people: ids(people),
            free_rooms: rooms.iter().map(|r| RoomId::from(*r)).collect(),
        }
    }))
}

fn class(s: &str) -> ClassRef {
    ClassRef {
        subject: s.into(),
        division: "A".into(),
    }
}

/// Mon has one slot where only A is free. Tue and Wed each have two slots
/// splitting A+B from C. Rooms R1 (always taken) and R2.
pub fn week() -> Snapshot {
    let person = |id: &str, subject: &str| Person {
        id: id.into(),
        name: id.into(),
        affiliation: "ME".into(),
        enrollments: [class(subject)].into_iter().collect(),
    };
    let entry = |day: &str, time: &str, subject: &str| TimetableEntry {
        slot: slot(day, time),
        class: class(subject),
        room: "R1".into(),
    };
    Snapshot::build(
        vec![person("A", "X"), person("B", "Y"), person("C", "Z")],
        vec![
            entry("mon", "09:00-10:00", "Y"),
            entry("mon", "09:00-10:00", "Z"),
            entry("tue", "09:00-10:00", "Z"),
            entry("tue", "10:00-11:00", "X"),
            entry("tue", "10:00-11:00", "Y"),
            entry("wed", "09:00-10:00", "Z"),
            entry("wed", "10:00-11:00", "X"),
            entry("wed", "10:00-11:00", "Y"),
        ],
        Some(["R1", "R2"].into_iter().map(RoomId::from).collect()),
        &BTreeSet::new(),
    )
    .unwrap()
}
