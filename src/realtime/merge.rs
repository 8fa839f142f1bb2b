//! Merges the three decoded GTFS-RT feeds into one per-trip view.
//!
//! Deterministic and free of I/O: the same three feeds always produce the
//! same [`RealtimeStatus`]. Map ordering is not contractual.

use std::collections::BTreeMap;

use crate::gtfs_rt::{alert, Alert, FeedMessage, TranslatedString, TripUpdate};

use super::status::{RealtimeStatus, ServiceAlert, TripStatus, VehiclePos};

/// Builds the published realtime view from the trip-update, vehicle-position
/// and alert feeds.
pub fn merge_feeds(
    trip_updates: &FeedMessage,
    vehicles: &FeedMessage,
    alerts: &FeedMessage,
) -> RealtimeStatus {
    let mut by_trip: BTreeMap<String, TripStatus> = BTreeMap::new();

    for entity in &trip_updates.entity {
        let Some(update) = &entity.trip_update else {
            continue;
        };
        let trip_id = update.trip.trip_id();
        if trip_id.is_empty() {
            continue;
        }
        by_trip.insert(trip_id.to_string(), trip_status(update));
    }

    for entity in &vehicles.entity {
        let Some(vehicle) = &entity.vehicle else {
            continue;
        };
        let trip_id = vehicle.trip.as_ref().map(|t| t.trip_id()).unwrap_or("");
        if trip_id.is_empty() {
            continue;
        }
        let Some(position) = &vehicle.position else {
            continue;
        };

        let la = position.latitude as f64;
        let lo = position.longitude as f64;
        if !la.is_finite() || !lo.is_finite() {
            continue;
        }

        let Some(status) = by_trip.get_mut(trip_id) else {
            continue;
        };
        status.p = Some(VehiclePos {
            la: quantize(la),
            lo: quantize(lo),
            b: position
                .bearing
                .map(f64::from)
                .filter(|v| v.is_finite() && *v != 0.0),
            sp: position
                .speed
                .map(f64::from)
                .filter(|v| v.is_finite() && *v != 0.0),
        });
        if let Some(current) = vehicle.current_status {
            status.st = current.clamp(0, 2) as u8;
        }
    }

    let a = alerts
        .entity
        .iter()
        .filter_map(|e| e.alert.as_ref())
        .map(service_alert)
        .collect();

    RealtimeStatus {
        t: [&trip_updates.header, &vehicles.header, &alerts.header]
            .iter()
            .filter_map(|h| h.timestamp)
            .max()
            .unwrap_or(0),
        by_trip,
        a,
    }
}

/// Reduces one trip update to a per-trip record.
///
/// Stop context is the first stop-time update carrying a stop id. The scan
/// then looks for the first non-zero delay, departure preferred over
/// arrival per stop; a hit overrides the stop context. Zero delays are "no
/// signal", so a trip with only zeros falls back to the trip-level delay
/// (itself only taken when non-zero).
fn trip_status(update: &TripUpdate) -> TripStatus {
    let mut stop = update
        .stop_time_update
        .iter()
        .find_map(|stu| stu.stop_id.clone().filter(|s| !s.is_empty()));

    let mut delay: Option<i32> = None;
    let mut predicted: Option<i64> = None;

    for stu in &update.stop_time_update {
        if delay.is_none() {
            let stop_delay = stu
                .departure
                .as_ref()
                .and_then(|e| e.delay)
                .filter(|d| *d != 0)
                .or_else(|| {
                    stu.arrival
                        .as_ref()
                        .and_then(|e| e.delay)
                        .filter(|d| *d != 0)
                });
            if let Some(d) = stop_delay {
                delay = Some(d);
                if let Some(sid) = &stu.stop_id {
                    if !sid.is_empty() {
                        stop = Some(sid.clone());
                    }
                }
            }
        }

        if predicted.is_none() {
            predicted = stu
                .departure
                .as_ref()
                .and_then(|e| e.time)
                .filter(|t| *t != 0)
                .or_else(|| {
                    stu.arrival
                        .as_ref()
                        .and_then(|e| e.time)
                        .filter(|t| *t != 0)
                });
        }
    }

    let delay = delay.or_else(|| update.delay.filter(|d| *d != 0));

    TripStatus {
        d: delay,
        t: predicted,
        s: stop,
        ..Default::default()
    }
}

fn service_alert(al: &Alert) -> ServiceAlert {
    let mut stops = Vec::new();
    let mut trips = Vec::new();
    for informed in &al.informed_entity {
        if let Some(sid) = &informed.stop_id {
            if !sid.is_empty() {
                stops.push(sid.clone());
            }
        }
        if let Some(trip) = &informed.trip {
            let tid = trip.trip_id();
            if !tid.is_empty() {
                trips.push(tid.to_string());
            }
        }
    }

    let (start, end) = al
        .active_period
        .first()
        .map(|p| (p.start, p.end))
        .unwrap_or((None, None));

    ServiceAlert {
        h: english(&al.header_text),
        d: english(&al.description_text),
        c: al
            .cause
            .and_then(|v| alert::Cause::try_from(v).ok())
            .map(|c| c.as_str_name().to_string()),
        e: al
            .effect
            .and_then(|v| alert::Effect::try_from(v).ok())
            .map(|e| e.as_str_name().to_string()),
        s: (!stops.is_empty()).then_some(stops),
        tr: (!trips.is_empty()).then_some(trips),
        st: start,
        en: end,
    }
}

/// English translation of a translated string; `""` when no translation
/// is tagged `en`.
fn english(text: &Option<TranslatedString>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    text.translation
        .iter()
        .find(|t| t.language() == "en")
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

/// Rounds to five decimal places, half away from zero.
fn quantize(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}
