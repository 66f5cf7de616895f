use thiserror::Error;
use types::{ClassRef, ParseDayError, ParseTimeError, RoomId, Slot};

/// Malformed or inconsistent external data. Fatal at startup.
#[derive(Debug, Error)]
pub enum DataIntegrityError {
    #[error("timetable has no entries")]
    EmptyTimetable,
    #[error("room pool is empty")]
    EmptyRoomPool,
    #[error("{table} row {row}: field `{field}` is empty")]
    EmptyField {
        table: &'static str,
        row: usize,
        field: &'static str,
    },
    #[error("{table} row {row}: {source}")]
    BadDay {
        table: &'static str,
        row: usize,
        #[source]
        source: ParseDayError,
    },
    #[error("{table} row {row}: {source}")]
    BadTime {
        table: &'static str,
        row: usize,
        #[source]
        source: ParseTimeError,
    },
    #[error("class {class} at {slot} uses room {room}, which is not in the room pool")]
    UnknownRoom {
        class: ClassRef,
        slot: Slot,
        room: RoomId,
    },
}

/// A request rejected before any search runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidRequest {
    #[error("no people in the target set")]
    EmptyTarget,
    #[error("batch count must be at least 1")]
    ZeroBatches,
    #[error("unknown person ids: {}", .0.join(", "))]
    UnknownPeople(Vec<String>),
    #[error("no one is enrolled in {0}")]
    UnknownClass(ClassRef),
    #[error("unknown day: {0}")]
    UnknownDay(String),
    #[error("malformed time window: {0}")]
    BadTimeWindow(String),
    #[error("no timetable slot at {day} {time}")]
    UnknownSlot { day: String, time: String },
    #[error("slot filter matches no schedulable slot")]
    EmptyPool,
    #[error("at least one per-batch slot pool is required")]
    NoPools,
    #[error("slot pool for batch {0} matches no schedulable slot")]
    EmptyBatchPool(usize),
    #[error("max batches {max} is below the requested {requested}")]
    MaxBelowRequest { requested: usize, max: usize },
}

/// Multi-pool planning: no slot in this batch's pool can host anyone.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("batch {index} has no feasible slot in its pool")]
pub struct UnsatisfiableBatch {
    pub index: usize,
}
