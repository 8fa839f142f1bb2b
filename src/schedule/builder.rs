//! Builds the compact schedule bundle from the parsed GTFS tables.
//!
//! One I/O boundary (the archive bytes come in as a slice); everything
//! here is deterministic transformation, so the same archive always
//! produces byte-identical output and the same version hash.

use std::collections::{BTreeMap, HashMap};

use sha2::{Digest, Sha256};

use crate::error::Result;

use super::archive::GtfsTables;
use super::model::{
    pair_key, CalendarEntry, CalendarException, FareTable, ScheduleMeta, ServiceRules, Station,
    StaticSchedule, TripRecord, ZoneInfo, SCHEMA_VERSION,
};

/// Builds a [`StaticSchedule`] from raw archive bytes.
pub fn build_schedule(bytes: &[u8]) -> Result<StaticSchedule> {
    let tables = GtfsTables::from_zip(bytes)?;
    let version = hex_digest(bytes);
    Ok(build_from_tables(&tables, version))
}

/// Builds the bundle from already-parsed tables; `version` is the content
/// hash of the source archive.
pub fn build_from_tables(tables: &GtfsTables, version: String) -> StaticSchedule {
    let (stations, stop_to_station) = canonical_stations(tables);

    // Stop sequences per trip: ordered canonical stations plus the
    // interleaved [arr, dep, …] minute array.
    let mut stop_times_by_trip: HashMap<&str, Vec<&super::raw::StopTimeRow>> = HashMap::new();
    for row in &tables.stop_times {
        stop_times_by_trip
            .entry(row.trip_id.as_str())
            .or_default()
            .push(row);
    }
    for rows in stop_times_by_trip.values_mut() {
        rows.sort_by_key(|r| r.stop_sequence);
    }

    let route_names: HashMap<&str, &str> = tables
        .routes
        .iter()
        .map(|r| {
            let name = if r.route_short_name.is_empty() {
                r.route_id.as_str()
            } else {
                r.route_short_name.as_str()
            };
            (r.route_id.as_str(), name)
        })
        .collect();

    // Pattern deduplication: the first trip with a given station sequence
    // allocates the next pattern id, later trips reuse it. Trips are
    // walked in table order so ids are stable for a given archive.
    let mut patterns: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut pattern_by_sequence: HashMap<String, String> = HashMap::new();
    let mut trips: Vec<TripRecord> = Vec::new();

    for trip in &tables.trips {
        let Some(rows) = stop_times_by_trip.get(trip.trip_id.as_str()) else {
            continue;
        };

        let mut sequence: Vec<String> = Vec::with_capacity(rows.len());
        let mut minutes: Vec<u32> = Vec::with_capacity(rows.len() * 2);
        for row in rows {
            let Some(station_id) = stop_to_station.get(row.stop_id.as_str()) else {
                continue;
            };
            let arrival = parse_gtfs_time(&row.arrival_time);
            let departure = parse_gtfs_time(&row.departure_time);
            // A blank time mirrors its counterpart; a stop with neither is
            // dropped.
            let (Some(arrival), Some(departure)) =
                (arrival.or(departure), departure.or(arrival))
            else {
                continue;
            };
            sequence.push(station_id.clone());
            minutes.push(arrival);
            minutes.push(departure);
        }
        if sequence.is_empty() {
            continue;
        }

        let sequence_key = sequence.join(",");
        let pattern_id = pattern_by_sequence
            .entry(sequence_key)
            .or_insert_with(|| {
                let id = format!("p{}", patterns.len());
                patterns.insert(id.clone(), sequence.clone());
                id
            })
            .clone();

        trips.push(TripRecord {
            i: if trip.trip_short_name.is_empty() {
                trip.trip_id.clone()
            } else {
                trip.trip_short_name.clone()
            },
            s: trip.service_id.clone(),
            p: pattern_id,
            d: trip.direction_id.unwrap_or(0),
            st: minutes,
            rt: route_names
                .get(trip.route_id.as_str())
                .copied()
                .unwrap_or(trip.route_id.as_str())
                .to_string(),
        });
    }

    // Station-pair inverted index over every ordered (i, j) pair with
    // i < j. Quadratic per pattern, fine at commuter-rail scale.
    let mut pairs: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for trip in &trips {
        let stops = &patterns[&trip.p];
        for i in 0..stops.len() {
            for j in (i + 1)..stops.len() {
                pairs
                    .entry(pair_key(&stops[i], &stops[j]))
                    .or_default()
                    .push(trip.i.clone());
            }
        }
    }

    let mut rules = ServiceRules::default();
    for row in &tables.calendar {
        rules.c.insert(
            row.service_id.clone(),
            CalendarEntry {
                days: [
                    row.monday,
                    row.tuesday,
                    row.wednesday,
                    row.thursday,
                    row.friday,
                    row.saturday,
                    row.sunday,
                ],
                start: row.start_date,
                end: row.end_date,
            },
        );
    }
    for row in &tables.calendar_dates {
        rules
            .e
            .entry(row.service_id.clone())
            .or_default()
            .push(CalendarException {
                date: row.date,
                kind: row.exception_type,
            });
    }

    let fares = fare_table(tables);

    // North-to-south ordering, derived from latitude.
    let mut ordered: Vec<&String> = stations.keys().collect();
    ordered.sort_by(|a, b| {
        stations[*b]
            .lat
            .partial_cmp(&stations[*a].lat)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cmp(b))
    });
    let ordered: Vec<String> = ordered.into_iter().cloned().collect();

    let max_end = tables.calendar.iter().map(|c| c.end_date).max().unwrap_or(0);

    StaticSchedule {
        m: ScheduleMeta {
            v: version,
            e: max_end,
            sv: SCHEMA_VERSION,
        },
        p: patterns,
        t: trips,
        r: rules,
        s: stations,
        f: fares,
        x: pairs,
        o: ordered,
    }
}

/// Parent stations become canonical stations; platform stops attach to
/// their parent and may donate a zone. Parents with zero children are
/// dropped. Returns the station map plus the platform-to-station lookup.
fn canonical_stations(
    tables: &GtfsTables,
) -> (BTreeMap<String, Station>, HashMap<String, String>) {
    let mut stations: BTreeMap<String, Station> = BTreeMap::new();
    for row in &tables.stops {
        if row.location_type == Some(1) {
            stations.insert(
                row.stop_id.clone(),
                Station {
                    n: clean_station_name(&row.stop_name),
                    z: row.zone_id.clone(),
                    ids: Vec::new(),
                    lat: row.stop_lat.unwrap_or(0.0),
                    lon: row.stop_lon.unwrap_or(0.0),
                },
            );
        }
    }

    let mut stop_to_station = HashMap::new();
    for row in &tables.stops {
        if row.location_type.unwrap_or(0) != 0 || row.parent_station.is_empty() {
            continue;
        }
        let Some(station) = stations.get_mut(&row.parent_station) else {
            continue;
        };
        station.ids.push(row.stop_id.clone());
        if station.z.is_empty() && !row.zone_id.is_empty() {
            station.z = row.zone_id.clone();
        }
        stop_to_station.insert(row.stop_id.clone(), row.parent_station.clone());
    }

    stations.retain(|_, s| !s.ids.is_empty());
    (stations, stop_to_station)
}

/// Strips the agency's cosmetic `" Caltrain Station"` suffix noise from
/// rider-visible names.
fn clean_station_name(name: &str) -> String {
    name.replace(" Caltrain Station ", " ")
        .replace(" Caltrain Station", "")
        .trim()
        .to_string()
}

fn fare_table(tables: &GtfsTables) -> FareTable {
    let prices: HashMap<&str, u32> = tables
        .fare_attributes
        .iter()
        .map(|f| (f.fare_id.as_str(), (f.price * 100.0).round() as u32))
        .collect();

    let mut fares = BTreeMap::new();
    for rule in &tables.fare_rules {
        if rule.origin_id.is_empty() || rule.destination_id.is_empty() {
            continue;
        }
        let Some(cents) = prices.get(rule.fare_id.as_str()) else {
            continue;
        };
        fares.insert(pair_key(&rule.origin_id, &rule.destination_id), *cents);
    }

    let zones = tables
        .zone_attributes
        .iter()
        .map(|z| {
            (
                z.zone_id.clone(),
                ZoneInfo {
                    name: z.zone_name.clone(),
                },
            )
        })
        .collect();

    FareTable { zones, fares }
}

/// `HH:MM:SS` to minutes past local midnight. Hours may exceed 23 so
/// post-midnight trips keep growing instead of wrapping.
pub fn parse_gtfs_time(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let mut parts = value.splitn(3, ':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    Some(hours * 60 + minutes)
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::raw::{
        CalendarDateRow, CalendarRow, FareAttributeRow, FareRuleRow, RouteRow, StopRow,
        StopTimeRow, TripRow, ZoneAttributeRow,
    };

    fn parent(id: &str, name: &str, zone: &str, lat: f64) -> StopRow {
        StopRow {
            stop_id: id.to_string(),
            stop_name: name.to_string(),
            zone_id: zone.to_string(),
            stop_lat: Some(lat),
            stop_lon: Some(-122.0),
            location_type: Some(1),
            parent_station: String::new(),
        }
    }

    fn platform(id: &str, parent: &str, zone: &str) -> StopRow {
        StopRow {
            stop_id: id.to_string(),
            stop_name: format!("{id} platform"),
            zone_id: zone.to_string(),
            stop_lat: None,
            stop_lon: None,
            location_type: Some(0),
            parent_station: parent.to_string(),
        }
    }

    fn stop_time(trip: &str, arr: &str, dep: &str, stop: &str, seq: u32) -> StopTimeRow {
        StopTimeRow {
            trip_id: trip.to_string(),
            arrival_time: arr.to_string(),
            departure_time: dep.to_string(),
            stop_id: stop.to_string(),
            stop_sequence: seq,
        }
    }

    fn trip(id: &str, short: &str, service: &str, direction: Option<u8>) -> TripRow {
        TripRow {
            route_id: "L1".to_string(),
            service_id: service.to_string(),
            trip_id: id.to_string(),
            trip_short_name: short.to_string(),
            direction_id: direction,
        }
    }

    fn weekday_calendar(service: &str) -> CalendarRow {
        CalendarRow {
            service_id: service.to_string(),
            monday: 1,
            tuesday: 1,
            wednesday: 1,
            thursday: 1,
            friday: 1,
            saturday: 0,
            sunday: 0,
            start_date: 20260101,
            end_date: 20261231,
        }
    }

    /// The two-station fixture: one weekday trip 101 from B to A.
    fn minimal_tables() -> GtfsTables {
        GtfsTables {
            stops: vec![
                parent("station_a", "Alpha Caltrain Station", "Z1", 37.40),
                platform("stop_a1", "station_a", ""),
                parent("station_b", "Beta Caltrain Station", "", 37.20),
                platform("stop_b1", "station_b", "Z2"),
            ],
            routes: vec![RouteRow {
                route_id: "L1".to_string(),
                route_short_name: "Local".to_string(),
            }],
            trips: vec![trip("t101", "101", "svc1", Some(0))],
            stop_times: vec![
                stop_time("t101", "08:00:00", "08:01:00", "stop_b1", 1),
                stop_time("t101", "08:30:00", "08:30:00", "stop_a1", 2),
            ],
            calendar: vec![weekday_calendar("svc1")],
            calendar_dates: vec![],
            fare_attributes: vec![
                FareAttributeRow {
                    fare_id: "f1".to_string(),
                    price: 4.00,
                },
                FareAttributeRow {
                    fare_id: "f2".to_string(),
                    price: 4.00,
                },
            ],
            fare_rules: vec![
                FareRuleRow {
                    fare_id: "f1".to_string(),
                    origin_id: "Z1".to_string(),
                    destination_id: "Z2".to_string(),
                },
                FareRuleRow {
                    fare_id: "f2".to_string(),
                    origin_id: "Z2".to_string(),
                    destination_id: "Z1".to_string(),
                },
            ],
            zone_attributes: vec![
                ZoneAttributeRow {
                    zone_id: "Z1".to_string(),
                    zone_name: "Zone 1".to_string(),
                },
                ZoneAttributeRow {
                    zone_id: "Z2".to_string(),
                    zone_name: "Zone 2".to_string(),
                },
            ],
        }
    }

    #[test]
    fn builds_the_minimal_bundle() {
        let schedule = build_from_tables(&minimal_tables(), "v1".to_string());

        assert_eq!(schedule.p.len(), 1);
        assert_eq!(
            schedule.p["p0"],
            vec!["station_b".to_string(), "station_a".to_string()]
        );

        assert_eq!(schedule.t.len(), 1);
        let trip = &schedule.t[0];
        assert_eq!(trip.i, "101");
        assert_eq!(trip.s, "svc1");
        assert_eq!(trip.p, "p0");
        assert_eq!(trip.st, vec![480, 481, 510, 510]);
        assert_eq!(trip.rt, "Local");

        assert_eq!(schedule.x["station_b→station_a"], vec!["101".to_string()]);
        assert_eq!(schedule.f.fares["Z1→Z2"], 400);
        assert_eq!(schedule.f.fares["Z2→Z1"], 400);
        assert_eq!(schedule.f.zones["Z1"].name, "Zone 1");

        // Alpha is further north, so it leads the ordered list.
        assert_eq!(schedule.o, vec!["station_a".to_string(), "station_b".to_string()]);
        assert_eq!(schedule.m.e, 20261231);
        assert_eq!(schedule.m.v, "v1");
    }

    #[test]
    fn station_names_are_cleaned_and_zones_inherited() {
        let schedule = build_from_tables(&minimal_tables(), "v".to_string());
        assert_eq!(schedule.s["station_a"].n, "Alpha");
        assert_eq!(schedule.s["station_a"].z, "Z1");
        // Parent had no zone, first zoned child donates it.
        assert_eq!(schedule.s["station_b"].z, "Z2");
        assert_eq!(schedule.s["station_b"].ids, vec!["stop_b1".to_string()]);
    }

    #[test]
    fn childless_parents_are_dropped() {
        let mut tables = minimal_tables();
        tables.stops.push(parent("station_c", "Gamma", "Z3", 37.0));
        let schedule = build_from_tables(&tables, "v".to_string());
        assert!(!schedule.s.contains_key("station_c"));
        assert!(!schedule.o.contains(&"station_c".to_string()));
    }

    #[test]
    fn identical_stop_sequences_share_one_pattern() {
        let mut tables = minimal_tables();
        tables.trips.push(trip("t102", "103", "svc1", Some(0)));
        tables.stop_times.extend(vec![
            stop_time("t102", "09:00:00", "09:01:00", "stop_b1", 1),
            stop_time("t102", "09:30:00", "09:30:00", "stop_a1", 2),
        ]);
        let schedule = build_from_tables(&tables, "v".to_string());
        assert_eq!(schedule.p.len(), 1);
        assert_eq!(schedule.t[0].p, "p0");
        assert_eq!(schedule.t[1].p, "p0");
        assert_eq!(
            schedule.x["station_b→station_a"],
            vec!["101".to_string(), "103".to_string()]
        );
    }

    #[test]
    fn differing_sequences_allocate_new_patterns() {
        let mut tables = minimal_tables();
        tables.trips.push(trip("t201", "202", "svc1", Some(1)));
        tables.stop_times.extend(vec![
            stop_time("t201", "10:00:00", "10:01:00", "stop_a1", 1),
            stop_time("t201", "10:30:00", "10:30:00", "stop_b1", 2),
        ]);
        let schedule = build_from_tables(&tables, "v".to_string());
        assert_eq!(schedule.p.len(), 2);
        assert_eq!(
            schedule.p["p1"],
            vec!["station_a".to_string(), "station_b".to_string()]
        );
        assert_eq!(schedule.x["station_a→station_b"], vec!["202".to_string()]);
    }

    #[test]
    fn post_midnight_times_keep_growing() {
        let mut tables = minimal_tables();
        tables.stop_times = vec![
            stop_time("t101", "25:30:00", "25:31:00", "stop_b1", 1),
            stop_time("t101", "26:00:00", "26:00:00", "stop_a1", 2),
        ];
        let schedule = build_from_tables(&tables, "v".to_string());
        assert_eq!(schedule.t[0].st, vec![1530, 1531, 1560, 1560]);
    }

    #[test]
    fn unknown_stops_are_dropped_from_sequences() {
        let mut tables = minimal_tables();
        tables
            .stop_times
            .insert(1, stop_time("t101", "08:10:00", "08:10:00", "mystery", 5));
        // The mystery stop maps to no station, so the pattern is unchanged
        // apart from re-sorted sequence numbers.
        let schedule = build_from_tables(&tables, "v".to_string());
        assert_eq!(schedule.p["p0"].len(), 2);
        assert_eq!(schedule.t[0].st.len(), 4);
    }

    #[test]
    fn trips_without_stop_times_are_skipped() {
        let mut tables = minimal_tables();
        tables.trips.push(trip("ghost", "999", "svc1", None));
        let schedule = build_from_tables(&tables, "v".to_string());
        assert_eq!(schedule.t.len(), 1);
    }

    #[test]
    fn raw_trip_id_is_used_when_short_name_is_missing() {
        let mut tables = minimal_tables();
        tables.trips[0].trip_short_name = String::new();
        let schedule = build_from_tables(&tables, "v".to_string());
        assert_eq!(schedule.t[0].i, "t101");
    }

    #[test]
    fn calendar_exceptions_are_grouped_by_service() {
        let mut tables = minimal_tables();
        tables.calendar_dates = vec![
            CalendarDateRow {
                service_id: "svc1".to_string(),
                date: 20260704,
                exception_type: 2,
            },
            CalendarDateRow {
                service_id: "svc1".to_string(),
                date: 20260705,
                exception_type: 1,
            },
        ];
        let schedule = build_from_tables(&tables, "v".to_string());
        assert_eq!(schedule.r.e["svc1"].len(), 2);
        assert!(!schedule.is_service_active("svc1", 20260704));
        assert!(schedule.is_service_active("svc1", 20260705));
    }

    #[test]
    fn fares_are_integer_cents() {
        let mut tables = minimal_tables();
        tables.fare_attributes.push(FareAttributeRow {
            fare_id: "f3".to_string(),
            price: 10.55,
        });
        tables.fare_rules.push(FareRuleRow {
            fare_id: "f3".to_string(),
            origin_id: "Z1".to_string(),
            destination_id: "Z3".to_string(),
        });
        let schedule = build_from_tables(&tables, "v".to_string());
        assert_eq!(schedule.f.fares["Z1→Z3"], 1055);
    }

    #[test]
    fn time_parsing() {
        assert_eq!(parse_gtfs_time("08:00:00"), Some(480));
        assert_eq!(parse_gtfs_time("8:05:30"), Some(485));
        assert_eq!(parse_gtfs_time("25:30:00"), Some(1530));
        assert_eq!(parse_gtfs_time(""), None);
        assert_eq!(parse_gtfs_time("oops"), None);
        assert_eq!(parse_gtfs_time("-1:00:00"), None);
    }

    #[test]
    fn stop_time_arrays_are_twice_the_pattern_length() {
        let schedule = build_from_tables(&minimal_tables(), "v".to_string());
        for trip in &schedule.t {
            assert_eq!(trip.st.len(), 2 * schedule.p[&trip.p].len());
        }
    }
}
