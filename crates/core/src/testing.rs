use std::collections::BTreeSet;

use types::{ClassRef, Person, PersonId, RoomId, Slot, TimeRange, TimetableEntry};

use crate::index::Snapshot;

pub fn slot(day: &str, time: &str) -> Slot {
    Slot::new(day.parse().unwrap(), time.parse().unwrap())
}

pub fn class(subject: &str, division: &str) -> ClassRef {
    ClassRef {
        subject: subject.into(),
        division: division.into(),
    }
}

pub fn person(id: &str, name: &str, classes: &[(&str, &str)]) -> Person {
    Person {
        id: id.into(),
        name: name.into(),
        affiliation: "CS".into(),
        enrollments: classes.iter().map(|(s, d)| class(s, d)).collect(),
    }
}

pub fn entry(day: &str, time: &str, subject: &str, division: &str, room: &str) -> TimetableEntry {
    TimetableEntry {
        slot: slot(day, time),
        class: class(subject, division),
        room: room.into(),
    }
}

pub fn ids(names: &[&str]) -> BTreeSet<PersonId> {
    names.iter().map(|n| PersonId::from(*n)).collect()
}

/// Rooms R1-R3. mon 09 is fully booked, wed 13 is lunch.
pub fn fixture() -> Snapshot {
    let roster = vec![
        person("p1", "Asha Rao", &[("MATH", "A")]),
        person("p2", "Ben Ode", &[("PHY", "B")]),
        person("p3", "Chen Li", &[("CHEM", "A")]),
        person("p4", "Dara Kim", &[("BIO", "C")]),
        person("p1", "A. Rao", &[("ENG", "A")]),
    ];
    let timetable = vec![
        entry("mon", "09:00-10:00", "MATH", "A", "R1"),
        entry("mon", "09:00-10:00", "PHY", "B", "R2"),
        entry("mon", "09:00-10:00", "CHEM", "A", "R3"),
        entry("mon", "10:00-11:00", "CHEM", "A", "R1"),
        entry("tue", "09:00-10:00", "MATH", "A", "R1"),
        entry("tue", "09:00-10:00", "PHY", "B", "R2"),
        entry("wed", "13:00-14:00", "CHEM", "A", "R2"),
    ];
    let pool: BTreeSet<RoomId> = ["R1", "R2", "R3"].into_iter().map(RoomId::from).collect();
    let excluded: BTreeSet<TimeRange> = ["13:00-14:00".parse().unwrap()].into_iter().collect();
    Snapshot::build(roster, timetable, Some(pool), &excluded).unwrap()
}
