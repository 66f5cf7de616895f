use std::borrow::Cow;
use std::path::Path;

use anyhow::Context;
use sched_core::{DataIntegrityError, Snapshot};
use serde::Deserialize;
use tracing::info;
use types::{ClassRef, DayOfWeek, Person, Slot, TimeRange, TimetableEntry};

use crate::config::Settings;

const STUDENTS: &str = "students";
const TIMETABLE: &str = "timetable";

#[derive(Debug, Deserialize)]
struct StudentRow {
    #[serde(rename = "MIS")]
    mis: String,
    #[serde(rename = "FirstName")]
    first_name: String,
    #[serde(rename = "LastName", default)]
    last_name: String,
    #[serde(rename = "Branch", default)]
    branch: String,
    #[serde(rename = "Subject", default)]
    subject: String,
    #[serde(rename = "Division", default)]
    division: String,
}

#[derive(Debug, Deserialize)]
struct TimetableRow {
    #[serde(rename = "Day")]
    day: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Division")]
    division: String,
    #[serde(rename = "Room")]
    room: String,
}

/// UTF-8 when valid, otherwise every byte is read as its Latin-1 code point.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s.strip_prefix('\u{feff}').unwrap_or(s)),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// Trims and collapses internal runs of whitespace to one space.
pub fn normalize(field: &str) -> String {
    field.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn rows<T: for<'de> Deserialize<'de>>(bytes: &[u8], table: &str) -> anyhow::Result<Vec<T>> {
    let text = decode(bytes);
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("{table} row {}", i + 1)))
        .collect()
}

fn required(
    value: &str,
    table: &'static str,
    row: usize,
    field: &'static str,
) -> Result<String, DataIntegrityError> {
    let value = normalize(value);
    if value.is_empty() {
        return Err(DataIntegrityError::EmptyField { table, row, field });
    }
    Ok(value)
}

/// One `Person` per roster row. Rows sharing an id are merged later, when
/// the snapshot is built.
pub fn parse_roster(bytes: &[u8]) -> anyhow::Result<Vec<Person>> {
    let rows: Vec<StudentRow> = rows(bytes, STUDENTS)?;
    let mut people = Vec::with_capacity(rows.len());
    for (i, r) in rows.into_iter().enumerate() {
        let row = i + 1;
        let id = required(&r.mis, STUDENTS, row, "MIS")?;
        let first = required(&r.first_name, STUDENTS, row, "FirstName")?;
        let name = normalize(&format!("{first} {}", r.last_name));

        let subject = normalize(&r.subject);
        let division = normalize(&r.division);
        let enrollments = match (subject.is_empty(), division.is_empty()) {
            (true, true) => Default::default(),
            (true, false) => {
                return Err(DataIntegrityError::EmptyField {
                    table: STUDENTS,
                    row,
                    field: "Subject",
                }
                .into())
            }
            (false, true) => {
                return Err(DataIntegrityError::EmptyField {
                    table: STUDENTS,
                    row,
                    field: "Division",
                }
                .into())
            }
            (false, false) => [ClassRef {
                subject: subject.as_str().into(),
                division: division.as_str().into(),
            }]
            .into_iter()
            .collect(),
        };

        people.push(Person {
            id: id.as_str().into(),
            name,
            affiliation: normalize(&r.branch),
            enrollments,
        });
    }
    Ok(people)
}

pub fn parse_timetable(bytes: &[u8]) -> anyhow::Result<Vec<TimetableEntry>> {
    let rows: Vec<TimetableRow> = rows(bytes, TIMETABLE)?;
    let mut entries = Vec::with_capacity(rows.len());
    for (i, r) in rows.into_iter().enumerate() {
        let row = i + 1;
        let day: DayOfWeek = required(&r.day, TIMETABLE, row, "Day")?
            .parse()
            .map_err(|source| DataIntegrityError::BadDay {
                table: TIMETABLE,
                row,
                source,
            })?;
        let time: TimeRange = required(&r.time, TIMETABLE, row, "Time")?
            .parse()
            .map_err(|source| DataIntegrityError::BadTime {
                table: TIMETABLE,
                row,
                source,
            })?;
        entries.push(TimetableEntry {
            slot: Slot::new(day, time),
            class: ClassRef {
                subject: required(&r.subject, TIMETABLE, row, "Subject")?.as_str().into(),
                division: required(&r.division, TIMETABLE, row, "Division")?.as_str().into(),
            },
            room: required(&r.room, TIMETABLE, row, "Room")?.as_str().into(),
        });
    }
    Ok(entries)
}

/// Reads both configured files and builds a fresh snapshot.
pub fn load(settings: &Settings) -> anyhow::Result<Snapshot> {
    let roster = read(&settings.students).and_then(|b| parse_roster(&b))?;
    let timetable = read(&settings.timetable).and_then(|b| parse_timetable(&b))?;
    info!(
        roster_rows = roster.len(),
        timetable_rows = timetable.len(),
        "dataset read"
    );
    let snapshot = Snapshot::build(
        roster,
        timetable,
        settings.rooms.clone(),
        &settings.excluded_times,
    )
    .context("building schedule snapshot")?;
    Ok(snapshot)
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}
