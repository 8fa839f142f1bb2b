//! Wire types for the published schedule bundle.
//!
//! The single-letter field names are the cross-tier contract: clients
//! deserialize the whole bundle on every cold start, so the JSON stays
//! compact. Maps are `BTreeMap` so two builds of the same archive
//! serialize byte-identically.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Bundle schema version; bumped when the JSON contract changes shape.
pub const SCHEMA_VERSION: u32 = 1;

/// Bundle metadata: content hash, latest calendar end date, schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMeta {
    /// SHA-256 of the source archive bytes, hex.
    pub v: String,
    /// Max calendar end date, `YYYYMMDD`.
    pub e: u32,
    pub sv: u32,
}

/// A canonical, rider-visible station aggregating one or more platform
/// stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub n: String,
    /// Fare zone id; inherited from the first zoned child when the parent
    /// row carries none.
    pub z: String,
    /// Upstream platform stop ids that map to this station.
    pub ids: Vec<String>,
    pub lat: f64,
    pub lon: f64,
}

/// One scheduled run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    /// Train number (trip short name) or the raw trip id.
    pub i: String,
    /// Service id deciding which dates this trip runs.
    pub s: String,
    /// Pattern id into [`StaticSchedule::p`].
    pub p: String,
    /// Direction, 0 or 1.
    pub d: u8,
    /// Interleaved `[arr0, dep0, arr1, dep1, …]` minutes past local
    /// midnight; values exceed 1440 for post-midnight stops.
    pub st: Vec<u32>,
    /// Route short name, carried verbatim for client-side classification.
    pub rt: String,
}

/// Weekday mask plus inclusive date range for one service id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// `[mon, tue, wed, thu, fri, sat, sun]`, each 0 or 1.
    pub days: [u8; 7],
    pub start: u32,
    pub end: u32,
}

/// Calendar exception: type 1 adds service on the date, type 2 removes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarException {
    pub date: u32,
    #[serde(rename = "type")]
    pub kind: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceRules {
    /// Calendar entries by service id.
    pub c: BTreeMap<String, CalendarEntry>,
    /// Exceptions by service id.
    pub e: BTreeMap<String, Vec<CalendarException>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub name: String,
}

/// Zone metadata plus the direct price lookup. Fares are asymmetric: the
/// reverse pair may or may not exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FareTable {
    pub zones: BTreeMap<String, ZoneInfo>,
    /// `"originZone→destZone"` to price in integer cents.
    pub fares: BTreeMap<String, u32>,
}

/// The complete static bundle published as `schedule:data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticSchedule {
    pub m: ScheduleMeta,
    /// Pattern id to ordered canonical station ids.
    pub p: BTreeMap<String, Vec<String>>,
    pub t: Vec<TripRecord>,
    pub r: ServiceRules,
    pub s: BTreeMap<String, Station>,
    pub f: FareTable,
    /// `"origin→dest"` station pair to the trips serving it in that order.
    pub x: BTreeMap<String, Vec<String>>,
    /// Canonical north-to-south station ordering.
    pub o: Vec<String>,
}

/// Key for the fare and station-pair lookups.
pub fn pair_key(origin: &str, dest: &str) -> String {
    format!("{origin}→{dest}")
}

impl StaticSchedule {
    /// Whether `service_id` operates on `date` (`YYYYMMDD`).
    ///
    /// Exceptions override the weekday mask in both directions, including
    /// dates outside the calendar range.
    pub fn is_service_active(&self, service_id: &str, date: u32) -> bool {
        if let Some(exceptions) = self.r.e.get(service_id) {
            if let Some(exception) = exceptions.iter().find(|x| x.date == date) {
                return exception.kind == 1;
            }
        }
        let Some(calendar) = self.r.c.get(service_id) else {
            return false;
        };
        if date < calendar.start || date > calendar.end {
            return false;
        }
        match weekday_index(date) {
            Some(day) => calendar.days[day] == 1,
            None => false,
        }
    }
}

/// Monday-first weekday index for a `YYYYMMDD` date; `None` when the date
/// is not a real calendar date.
pub fn weekday_index(date: u32) -> Option<usize> {
    let year = (date / 10_000) as i32;
    let month = date / 100 % 100;
    let day = date % 100;
    let date = chrono::NaiveDate::from_ymd_opt(year, month, day)?;
    Some(chrono::Datelike::weekday(&date).num_days_from_monday() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule_with_service(days: [u8; 7], exceptions: Vec<CalendarException>) -> StaticSchedule {
        let mut rules = ServiceRules::default();
        rules.c.insert(
            "svc1".to_string(),
            CalendarEntry {
                days,
                start: 20260101,
                end: 20261231,
            },
        );
        if !exceptions.is_empty() {
            rules.e.insert("svc1".to_string(), exceptions);
        }
        StaticSchedule {
            m: ScheduleMeta {
                v: "test".to_string(),
                e: 20261231,
                sv: SCHEMA_VERSION,
            },
            p: BTreeMap::new(),
            t: vec![],
            r: rules,
            s: BTreeMap::new(),
            f: FareTable::default(),
            x: BTreeMap::new(),
            o: vec![],
        }
    }

    #[test]
    fn weekday_mask_within_range() {
        let schedule = schedule_with_service([1, 1, 1, 1, 1, 0, 0], vec![]);
        // 2026-07-03 is a Friday, 2026-07-04 a Saturday.
        assert!(schedule.is_service_active("svc1", 20260703));
        assert!(!schedule.is_service_active("svc1", 20260704));
    }

    #[test]
    fn out_of_range_dates_are_inactive() {
        let schedule = schedule_with_service([1; 7], vec![]);
        assert!(!schedule.is_service_active("svc1", 20251231));
        assert!(!schedule.is_service_active("svc1", 20270101));
    }

    #[test]
    fn exceptions_override_the_mask() {
        let schedule = schedule_with_service(
            [1, 1, 1, 1, 1, 0, 0],
            vec![
                CalendarException {
                    date: 20260704,
                    kind: 1,
                },
                CalendarException {
                    date: 20260706,
                    kind: 2,
                },
            ],
        );
        // Saturday forced on, Monday forced off.
        assert!(schedule.is_service_active("svc1", 20260704));
        assert!(!schedule.is_service_active("svc1", 20260706));
    }

    #[test]
    fn unknown_service_is_inactive() {
        let schedule = schedule_with_service([1; 7], vec![]);
        assert!(!schedule.is_service_active("nope", 20260701));
    }

    #[test]
    fn invalid_dates_are_inactive() {
        let schedule = schedule_with_service([1; 7], vec![]);
        assert!(!schedule.is_service_active("svc1", 20260230));
    }
}
