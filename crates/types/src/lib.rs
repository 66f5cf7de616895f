use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            Serialize,
            Deserialize,
            ToSchema,
            JsonSchema,
            Eq,
            PartialEq,
            Hash,
            PartialOrd,
            Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(PersonId);
id_newtype!(RoomId);
id_newtype!(SubjectId);
id_newtype!(DivisionId);

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
    PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
        DayOfWeek::Sat,
        DayOfWeek::Sun,
    ];

    pub fn short_name(self) -> &'static str {
        match self {
            DayOfWeek::Mon => "mon",
            DayOfWeek::Tue => "tue",
            DayOfWeek::Wed => "wed",
            DayOfWeek::Thu => "thu",
            DayOfWeek::Fri => "fri",
            DayOfWeek::Sat => "sat",
            DayOfWeek::Sun => "sun",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDayError(pub String);

impl fmt::Display for ParseDayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised day: {:?}", self.0)
    }
}

impl std::error::Error for ParseDayError {}

/// Accepts full or three-letter English names in any case.
impl FromStr for DayOfWeek {
    type Err = ParseDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let day = match lower.as_str() {
            "mon" | "monday" => DayOfWeek::Mon,
            "tue" | "tues" | "tuesday" => DayOfWeek::Tue,
            "wed" | "wednesday" => DayOfWeek::Wed,
            "thu" | "thur" | "thurs" | "thursday" => DayOfWeek::Thu,
            "fri" | "friday" => DayOfWeek::Fri,
            "sat" | "saturday" => DayOfWeek::Sat,
            "sun" | "sunday" => DayOfWeek::Sun,
            _ => return Err(ParseDayError(s.to_string())),
        };
        Ok(day)
    }
}

/// Minutes since midnight.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay(pub u16);

impl TimeOfDay {
    pub fn hm(h: u16, m: u16) -> Self {
        Self(h * 60 + m)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseTimeError(pub String);

impl fmt::Display for ParseTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised time range: {:?}", self.0)
    }
}

impl std::error::Error for ParseTimeError {}

impl FromStr for TimeOfDay {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimeError(s.to_string());
        let s = s.trim();
        let (h, m) = match s.split_once(&[':', '.'][..]) {
            Some((h, m)) => (h, m),
            None => (s, "0"),
        };
        let h: u16 = h.trim().parse().map_err(|_| err())?;
        let m: u16 = m.trim().parse().map_err(|_| err())?;
        if h > 24 || m > 59 || (h == 24 && m > 0) {
            return Err(err());
        }
        Ok(TimeOfDay::hm(h, m))
    }
}

/// Half-open `[start, end)` interval within one day. Serialized as
/// `"HH:MM-HH:MM"`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for TimeRange {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimeError(s.to_string());
        let (a, b) = s.split_once(&['-', '\u{2013}'][..]).ok_or_else(err)?;
        let start: TimeOfDay = a.parse().map_err(|_| err())?;
        let end: TimeOfDay = b.parse().map_err(|_| err())?;
        TimeRange::new(start, end).ok_or_else(err)
    }
}

impl TryFrom<String> for TimeRange {
    type Error = ParseTimeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeRange> for String {
    fn from(t: TimeRange) -> Self {
        t.to_string()
    }
}

impl JsonSchema for TimeRange {
    fn schema_name() -> String {
        "TimeRange".into()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// One cell of the weekly grid. Ordered by day, then time.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
    PartialOrd, Ord,
)]
pub struct Slot {
    pub day: DayOfWeek,
    #[schema(value_type = String, example = "09:00-10:00")]
    pub time: TimeRange,
}

impl Slot {
    pub fn new(day: DayOfWeek, time: TimeRange) -> Self {
        Self { day, time }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.time)
    }
}

#[derive(
    Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, PartialOrd,
    Ord,
)]
pub struct ClassRef {
    pub subject: SubjectId,
    pub division: DivisionId,
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subject, self.division)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub affiliation: String,
    #[serde(default)]
    pub enrollments: BTreeSet<ClassRef>,
}

impl Person {
    pub fn summary(&self) -> PersonSummary {
        PersonSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            affiliation: self.affiliation.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
pub struct PersonSummary {
    pub id: PersonId,
    pub name: String,
    pub affiliation: String,
}

/// A timetabled class: everyone enrolled in `class` is busy at `slot`, and
/// `room` is taken.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
pub struct TimetableEntry {
    pub slot: Slot,
    pub class: ClassRef,
    pub room: RoomId,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub slot: Slot,
    pub members: Vec<PersonId>,
    pub free_rooms: Vec<RoomId>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub batches: Vec<Batch>,
    /// Population standard deviation of batch sizes.
    pub score: f64,
    pub distinct_days: bool,
}

impl Solution {
    pub fn sizes(&self) -> Vec<usize> {
        self.batches.iter().map(|b| b.members.len()).collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoreBatches {
    pub batch_count: usize,
    pub solutions: Vec<Solution>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    #[serde(default)]
    pub more_batches: Option<MoreBatches>,
    /// Same batch count against the whole schedulable week.
    #[serde(default)]
    pub relaxed_pool: Option<Vec<Solution>>,
    #[serde(default)]
    pub feasible_days: Vec<DayOfWeek>,
}

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        self.more_batches.is_none() && self.relaxed_pool.is_none() && self.feasible_days.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success {
        batch_count: usize,
        solutions: Vec<Solution>,
    },
    SuggestedMoreBatches {
        batch_count: usize,
        solutions: Vec<Solution>,
    },
    Suggested {
        suggestions: Suggestions,
    },
    NoSolution,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MultiPoolOutcome {
    Planned {
        solutions: Vec<Solution>,
    },
    /// No per-batch tuple covered everyone; `outcome` is the single-pool
    /// search over the schedulable week.
    Fallback {
        #[serde(default)]
        unsatisfiable_batch: Option<usize>,
        outcome: Outcome,
    },
}

/// Who to place. `Text` is split on whitespace and commas.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TargetSpec {
    People(Vec<PersonId>),
    Text(String),
    Class(ClassRef),
}

/// Raw slot-pool filter as supplied by a caller. Empty `days` means every
/// day; `between` narrows to slots lying inside the window.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotFilter {
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub between: Option<String>,
    #[serde(default)]
    pub include_excluded: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub target: TargetSpec,
    pub batches: u32,
    #[serde(default)]
    pub filter: SlotFilter,
    #[serde(default)]
    pub max_batches: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MultiPoolRequest {
    pub target: TargetSpec,
    /// One filter per batch.
    pub pools: Vec<SlotFilter>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRequest {
    pub target: TargetSpec,
    pub day: String,
    pub time: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct BusyDetail {
    pub person: PersonSummary,
    pub subject: SubjectId,
    pub division: DivisionId,
    pub room: RoomId,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct ConflictReport {
    pub slot: Slot,
    pub busy: Vec<BusyDetail>,
    pub free: Vec<PersonSummary>,
}
