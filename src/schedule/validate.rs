//! Structural and referential-integrity checks over a built bundle.
//!
//! The daily worker publishes only when the violation list comes back
//! empty; a truncated or inconsistent upstream archive fails the run
//! instead of reaching clients.

use super::model::StaticSchedule;

/// Minimum plausible sizes for a real commuter-rail bundle.
const MIN_STATIONS: usize = 10;
const MIN_TRIPS: usize = 10;
const MIN_PATTERNS: usize = 2;

/// Returns every violated expectation; empty means publishable.
/// `min_end_date` is the lower bound (`YYYYMMDD`) the calendar must reach.
pub fn validate_schedule(schedule: &StaticSchedule, min_end_date: u32) -> Vec<String> {
    let mut violations = Vec::new();

    if schedule.m.v.is_empty() {
        violations.push("metadata version is empty".to_string());
    }
    if schedule.m.e < min_end_date {
        violations.push(format!(
            "calendar ends {} before required {}",
            schedule.m.e, min_end_date
        ));
    }

    if schedule.s.len() < MIN_STATIONS {
        violations.push(format!(
            "only {} stations, expected at least {}",
            schedule.s.len(),
            MIN_STATIONS
        ));
    }
    if schedule.t.len() < MIN_TRIPS {
        violations.push(format!(
            "only {} trips, expected at least {}",
            schedule.t.len(),
            MIN_TRIPS
        ));
    }
    if schedule.p.len() < MIN_PATTERNS {
        violations.push(format!(
            "only {} patterns, expected at least {}",
            schedule.p.len(),
            MIN_PATTERNS
        ));
    }

    for (pattern_id, stops) in &schedule.p {
        for stop in stops {
            if !schedule.s.contains_key(stop) {
                violations.push(format!(
                    "pattern {pattern_id} references unknown station {stop}"
                ));
            }
        }
    }

    for trip in &schedule.t {
        match schedule.p.get(&trip.p) {
            None => violations.push(format!("trip {} references unknown pattern {}", trip.i, trip.p)),
            Some(stops) => {
                if trip.st.len() != 2 * stops.len() {
                    violations.push(format!(
                        "trip {} has {} stop times for a {}-stop pattern",
                        trip.i,
                        trip.st.len(),
                        stops.len()
                    ));
                }
            }
        }
        if !schedule.r.c.contains_key(&trip.s) && !schedule.r.e.contains_key(&trip.s) {
            violations.push(format!(
                "trip {} references unknown service {}",
                trip.i, trip.s
            ));
        }
    }

    if schedule.o.is_empty() {
        violations.push("ordered station list is empty".to_string());
    }
    for station in &schedule.o {
        if !schedule.s.contains_key(station) {
            violations.push(format!("ordered list references unknown station {station}"));
        }
    }

    violations
}
