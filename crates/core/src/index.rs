use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{info, warn};
use types::{
    BusyDetail, ClassRef, ConflictReport, DayOfWeek, Person, PersonId, PersonSummary, RoomId,
    Slot, SlotFilter, TargetSpec, TimeRange, TimetableEntry,
};

use crate::availability::{map_availability, AvailabilityMap};
use crate::error::{DataIntegrityError, InvalidRequest};
use crate::query::SlotQuery;

/// Person id -> slots at which that person sits in a timetabled class.
#[derive(Clone, Debug, Default)]
pub struct BusySetIndex {
    by_person: HashMap<PersonId, BTreeSet<Slot>>,
}

impl BusySetIndex {
    pub fn slots_of(&self, person: &PersonId) -> Option<&BTreeSet<Slot>> {
        self.by_person.get(person)
    }

    /// Unknown people are never busy.
    pub fn is_busy(&self, person: &PersonId, slot: &Slot) -> bool {
        self.by_person
            .get(person)
            .map_or(false, |slots| slots.contains(slot))
    }
}

/// Slot -> rooms of the pool not taken by any class at that slot.
#[derive(Clone, Debug, Default)]
pub struct RoomOccupancy {
    pool: BTreeSet<RoomId>,
    free: BTreeMap<Slot, BTreeSet<RoomId>>,
}

impl RoomOccupancy {
    pub fn pool(&self) -> &BTreeSet<RoomId> {
        &self.pool
    }

    /// Slots without any timetabled class have the whole pool free.
    pub fn free_at(&self, slot: &Slot) -> &BTreeSet<RoomId> {
        self.free.get(slot).unwrap_or(&self.pool)
    }
}

/// Immutable view of the roster and timetable, built once and shared by
/// every request.
#[derive(Clone, Debug)]
pub struct Snapshot {
    people: BTreeMap<PersonId, Person>,
    entries: Vec<TimetableEntry>,
    busy: BusySetIndex,
    rooms: RoomOccupancy,
    classes_at: BTreeMap<Slot, Vec<usize>>,
    members: HashMap<ClassRef, BTreeSet<PersonId>>,
    universe: Vec<Slot>,
    schedulable: Vec<Slot>,
    days: BTreeSet<DayOfWeek>,
    times: BTreeSet<TimeRange>,
}

impl Snapshot {
    /// Roster rows sharing an id merge into one person: the first row's
    /// name and affiliation are kept, enrollments are unioned.
    ///
    /// With `room_pool == None` the pool is every room the timetable names.
    /// Slots whose time is in `excluded` stay in the universe but are left
    /// out of the schedulable subset.
    pub fn build(
        roster: Vec<Person>,
        timetable: Vec<TimetableEntry>,
        room_pool: Option<BTreeSet<RoomId>>,
        excluded: &BTreeSet<TimeRange>,
    ) -> Result<Self, DataIntegrityError> {
        if timetable.is_empty() {
            return Err(DataIntegrityError::EmptyTimetable);
        }

        let mut people: BTreeMap<PersonId, Person> = BTreeMap::new();
        let rows = roster.len();
        for p in roster {
            match people.get_mut(&p.id) {
                Some(existing) => existing.enrollments.extend(p.enrollments),
                None => {
                    people.insert(p.id.clone(), p);
                }
            }
        }
        if rows != people.len() {
            warn!(
                rows,
                people = people.len(),
                "roster rows merged by identifier"
            );
        }

        let pool = match room_pool {
            Some(pool) => pool,
            None => timetable.iter().map(|e| e.room.clone()).collect(),
        };
        if pool.is_empty() {
            return Err(DataIntegrityError::EmptyRoomPool);
        }

        let mut classes_at: BTreeMap<Slot, Vec<usize>> = BTreeMap::new();
        let mut slots_of_class: HashMap<&ClassRef, BTreeSet<Slot>> = HashMap::new();
        let mut free: BTreeMap<Slot, BTreeSet<RoomId>> = BTreeMap::new();
        for (i, e) in timetable.iter().enumerate() {
            if !pool.contains(&e.room) {
                return Err(DataIntegrityError::UnknownRoom {
                    class: e.class.clone(),
                    slot: e.slot,
                    room: e.room.clone(),
                });
            }
            classes_at.entry(e.slot).or_default().push(i);
            slots_of_class.entry(&e.class).or_default().insert(e.slot);
            free.entry(e.slot)
                .or_insert_with(|| pool.clone())
                .remove(&e.room);
        }

        let mut by_person: HashMap<PersonId, BTreeSet<Slot>> = HashMap::new();
        let mut members: HashMap<ClassRef, BTreeSet<PersonId>> = HashMap::new();
        for p in people.values() {
            let busy = by_person.entry(p.id.clone()).or_default();
            for class in &p.enrollments {
                if let Some(slots) = slots_of_class.get(class) {
                    busy.extend(slots.iter().copied());
                }
                members
                    .entry(class.clone())
                    .or_default()
                    .insert(p.id.clone());
            }
        }

        let universe: Vec<Slot> = classes_at.keys().copied().collect();
        let schedulable: Vec<Slot> = universe
            .iter()
            .filter(|s| !excluded.contains(&s.time))
            .copied()
            .collect();
        let days = universe.iter().map(|s| s.day).collect();
        let times = universe.iter().map(|s| s.time).collect();

        info!(
            people = people.len(),
            entries = timetable.len(),
            slots = universe.len(),
            schedulable = schedulable.len(),
            rooms = pool.len(),
            "schedule index built"
        );

        Ok(Self {
            people,
            entries: timetable,
            busy: BusySetIndex { by_person },
            rooms: RoomOccupancy { pool, free },
            classes_at,
            members,
            universe,
            schedulable,
            days,
            times,
        })
    }

    pub fn busy(&self) -> &BusySetIndex {
        &self.busy
    }

    pub fn rooms(&self) -> &RoomOccupancy {
        &self.rooms
    }

    pub fn entries(&self) -> &[TimetableEntry] {
        &self.entries
    }

    /// Every distinct slot the timetable uses, in day/time order.
    pub fn universe(&self) -> &[Slot] {
        &self.universe
    }

    /// The universe minus excluded times.
    pub fn schedulable(&self) -> &[Slot] {
        &self.schedulable
    }

    pub fn days(&self) -> &BTreeSet<DayOfWeek> {
        &self.days
    }

    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.people.get(id)
    }

    pub fn people_count(&self) -> usize {
        self.people.len()
    }

    /// Display record for `id`; people outside the roster get an empty name.
    pub fn summary(&self, id: &PersonId) -> PersonSummary {
        match self.people.get(id) {
            Some(p) => p.summary(),
            None => PersonSummary {
                id: id.clone(),
                name: String::new(),
                affiliation: String::new(),
            },
        }
    }

    pub fn resolve_target(&self, spec: &TargetSpec) -> Result<BTreeSet<PersonId>, InvalidRequest> {
        let target: BTreeSet<PersonId> = match spec {
            TargetSpec::People(ids) => ids
                .iter()
                .map(|id| PersonId(id.0.trim().to_string()))
                .filter(|id| !id.0.is_empty())
                .collect(),
            TargetSpec::Text(raw) => raw
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .map(PersonId::from)
                .collect(),
            TargetSpec::Class(class) => {
                return self
                    .members
                    .get(class)
                    .filter(|m| !m.is_empty())
                    .cloned()
                    .ok_or_else(|| InvalidRequest::UnknownClass(class.clone()));
            }
        };
        if target.is_empty() {
            return Err(InvalidRequest::EmptyTarget);
        }
        let unknown: Vec<String> = target
            .iter()
            .filter(|id| !self.people.contains_key(*id))
            .map(|id| id.0.clone())
            .collect();
        if !unknown.is_empty() {
            return Err(InvalidRequest::UnknownPeople(unknown));
        }
        Ok(target)
    }

    /// The slot for a day and time that both occur somewhere in the
    /// timetable. The pair itself need not have a class.
    pub fn slot(&self, day: &str, time: &str) -> Result<Slot, InvalidRequest> {
        let unknown = || InvalidRequest::UnknownSlot {
            day: day.to_string(),
            time: time.to_string(),
        };
        let d: DayOfWeek = day.parse().map_err(|_| unknown())?;
        let t: TimeRange = time.parse().map_err(|_| unknown())?;
        if !self.days.contains(&d) || !self.times.contains(&t) {
            return Err(unknown());
        }
        Ok(Slot::new(d, t))
    }

    pub fn slot_query(&self, filter: &SlotFilter) -> Result<SlotQuery, InvalidRequest> {
        SlotQuery::parse(filter, &self.days)
    }

    pub fn list_slots(&self, query: &SlotQuery) -> Vec<Slot> {
        let base = if query.include_excluded {
            &self.universe
        } else {
            &self.schedulable
        };
        base.iter().filter(|s| query.matches(s)).copied().collect()
    }

    /// Schedulable slots on a single day.
    pub fn day_slots(&self, day: DayOfWeek) -> Vec<Slot> {
        self.list_slots(&SlotQuery::on_days([day]))
    }

    pub fn free_rooms_at(&self, slot: &Slot) -> &BTreeSet<RoomId> {
        self.rooms.free_at(slot)
    }

    pub fn availability(&self, target: &BTreeSet<PersonId>, pool: &[Slot]) -> AvailabilityMap {
        map_availability(target, pool, &self.busy, &self.rooms)
    }

    /// Splits `target` into people in a class at `slot` and people who are
    /// free. Busy people get one row per clashing class.
    pub fn check_conflict(&self, target: &BTreeSet<PersonId>, slot: Slot) -> ConflictReport {
        let mut busy = Vec::new();
        let mut busy_ids: BTreeSet<&PersonId> = BTreeSet::new();
        for &i in self.classes_at.get(&slot).into_iter().flatten() {
            let entry = &self.entries[i];
            let Some(members) = self.members.get(&entry.class) else {
                continue;
            };
            for id in target.iter().filter(|id| members.contains(*id)) {
                busy_ids.insert(id);
                busy.push(BusyDetail {
                    person: self.summary(id),
                    subject: entry.class.subject.clone(),
                    division: entry.class.division.clone(),
                    room: entry.room.clone(),
                });
            }
        }
        let free = target
            .iter()
            .filter(|id| !busy_ids.contains(id))
            .map(|id| self.summary(id))
            .collect();
        ConflictReport { slot, busy, free }
    }
}
