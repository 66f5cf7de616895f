use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use solver_heur::{CandidateCap, SearchConfig};
use types::{RoomId, TimeRange};

const PREFIX: &str = "SLOTSPLIT__";

#[derive(Clone, Debug)]
pub struct Settings {
    pub port: u16,
    pub students: PathBuf,
    pub timetable: PathBuf,
    /// Explicit room pool. `None` derives it from the timetable.
    pub rooms: Option<BTreeSet<RoomId>>,
    pub excluded_times: BTreeSet<TimeRange>,
    pub search: SearchConfig,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `lookup` receives full variable names such as `SLOTSPLIT__SERVER__PORT`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| {
            lookup(&format!("{PREFIX}{key}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = SearchConfig::default();

        let port = parse_or(get("SERVER__PORT"), "SERVER__PORT", 8080)?;
        let students = get("DATA__STUDENTS").unwrap_or_else(|| "students.csv".into()).into();
        let timetable = get("DATA__TIMETABLE").unwrap_or_else(|| "timetable.csv".into()).into();

        let rooms =
            get("DATA__ROOMS").map(|raw| list(&raw).map(RoomId::from).collect::<BTreeSet<_>>());
        if matches!(&rooms, Some(r) if r.is_empty()) {
            return Err(anyhow!("{PREFIX}DATA__ROOMS names no rooms"));
        }

        let excluded_times = match get("DATA__EXCLUDED_TIMES") {
            None => BTreeSet::new(),
            Some(raw) => list(&raw)
                .map(|t| {
                    t.parse::<TimeRange>()
                        .with_context(|| format!("{PREFIX}DATA__EXCLUDED_TIMES: bad range `{t}`"))
                })
                .collect::<anyhow::Result<_>>()?,
        };

        let search = SearchConfig {
            top_n: parse_or(get("SOLVER__TOP_N"), "SOLVER__TOP_N", defaults.top_n)?,
            candidate_cap: match get("SOLVER__MAX_CANDIDATE_SLOTS") {
                None => defaults.candidate_cap,
                Some(v) => CandidateCap::from_limit(parse(&v, "SOLVER__MAX_CANDIDATE_SLOTS")?),
            },
            prefer_distinct_days: parse_or(
                get("SOLVER__PREFER_DISTINCT_DAYS"),
                "SOLVER__PREFER_DISTINCT_DAYS",
                defaults.prefer_distinct_days,
            )?,
            max_batches: parse_or(
                get("SOLVER__MAX_BATCHES"),
                "SOLVER__MAX_BATCHES",
                defaults.max_batches,
            )?,
        };
        if search.top_n == 0 {
            return Err(anyhow!("{PREFIX}SOLVER__TOP_N must be at least 1"));
        }

        Ok(Self {
            port,
            students,
            timetable,
            rooms,
            excluded_times,
            search,
        })
    }
}

fn list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse<T>(raw: &str, key: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse()
        .with_context(|| format!("{PREFIX}{key}: cannot parse `{raw}`"))
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map_or(Ok(default), |v| parse(&v, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (format!("{PREFIX}{k}"), v.to_string()))
            .collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.port, 8080);
        assert_eq!(s.students, PathBuf::from("students.csv"));
        assert!(s.rooms.is_none());
        assert!(s.excluded_times.is_empty());
        assert_eq!(s.search.top_n, 10);
        assert_eq!(s.search.candidate_cap, CandidateCap::Capped(12));
        assert!(s.search.prefer_distinct_days);
    }

    #[test]
    fn reads_every_section() {
        let s = settings(&[
            ("SERVER__PORT", "9000"),
            ("DATA__ROOMS", "R1, R2 ,,R3"),
            ("DATA__EXCLUDED_TIMES", "13:00-14:00"),
            ("SOLVER__MAX_CANDIDATE_SLOTS", "0"),
            ("SOLVER__PREFER_DISTINCT_DAYS", "false"),
            ("SOLVER__MAX_BATCHES", "5"),
        ])
        .unwrap();
        assert_eq!(s.port, 9000);
        assert_eq!(s.rooms.unwrap().len(), 3);
        assert_eq!(s.excluded_times.len(), 1);
        assert_eq!(s.search.candidate_cap, CandidateCap::Full);
        assert!(!s.search.prefer_distinct_days);
        assert_eq!(s.search.max_batches, 5);
    }

    #[test]
    fn malformed_values_are_fatal() {
        assert!(settings(&[("SERVER__PORT", "http")]).is_err());
        assert!(settings(&[("DATA__EXCLUDED_TIMES", "lunch")]).is_err());
        assert!(settings(&[("SOLVER__TOP_N", "0")]).is_err());
    }
}
