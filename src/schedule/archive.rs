//! Extraction of the CSV tables inside a GTFS zip archive.

use std::io::{Cursor, Read};

use serde::de::DeserializeOwned;
use zip::ZipArchive;

use crate::error::{PipelineError, Result};

use super::raw::{
    CalendarDateRow, CalendarRow, FareAttributeRow, FareRuleRow, RouteRow, StopRow, StopTimeRow,
    TripRow, ZoneAttributeRow,
};

/// The parsed tables of one GTFS archive.
#[derive(Debug, Clone, Default)]
pub struct GtfsTables {
    pub stops: Vec<StopRow>,
    pub routes: Vec<RouteRow>,
    pub trips: Vec<TripRow>,
    pub stop_times: Vec<StopTimeRow>,
    pub calendar: Vec<CalendarRow>,
    pub calendar_dates: Vec<CalendarDateRow>,
    pub fare_attributes: Vec<FareAttributeRow>,
    pub fare_rules: Vec<FareRuleRow>,
    pub zone_attributes: Vec<ZoneAttributeRow>,
}

impl GtfsTables {
    /// Parses the archive bytes. The core tables must be present; fare and
    /// exception tables are allowed to be absent.
    pub fn from_zip(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        Ok(GtfsTables {
            stops: read_table(&mut archive, "stops.txt")?,
            routes: read_table(&mut archive, "routes.txt")?,
            trips: read_table(&mut archive, "trips.txt")?,
            stop_times: read_table(&mut archive, "stop_times.txt")?,
            calendar: read_table(&mut archive, "calendar.txt")?,
            calendar_dates: read_optional_table(&mut archive, "calendar_dates.txt")?,
            fare_attributes: read_optional_table(&mut archive, "fare_attributes.txt")?,
            fare_rules: read_optional_table(&mut archive, "fare_rules.txt")?,
            zone_attributes: read_optional_table(&mut archive, "farezone_attributes.txt")?,
        })
    }
}

fn read_table<T: DeserializeOwned>(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<T>> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| PipelineError::Build(format!("archive is missing {name}")))?;
    let mut raw = Vec::new();
    file.read_to_end(&mut raw)?;
    parse_rows(&raw, name)
}

fn read_optional_table<T: DeserializeOwned>(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<T>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    let mut raw = Vec::new();
    file.read_to_end(&mut raw)?;
    parse_rows(&raw, name)
}

/// Deserializes CSV rows, tolerating a UTF-8 BOM on the header line.
fn parse_rows<T: DeserializeOwned>(raw: &[u8], name: &str) -> Result<Vec<T>> {
    let raw = raw.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(raw);
    let mut reader = csv::Reader::from_reader(raw);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: T =
            row.map_err(|e| PipelineError::Build(format!("malformed row in {name}: {e}")))?;
        rows.push(row);
    }
    Ok(rows)
}
