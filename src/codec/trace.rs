use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use geo::Point;
use log::info;

use crate::codec::error::CodecError;
use crate::route::transition::trace::{sort_by_time, GpsPoint};

/// Combined date+time layout of the GPS description, day first.
const TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Column layout of the GPS description.
const DATE: usize = 0;
const TIME: usize = 1;
const LATITUDE: usize = 2;
const LONGITUDE: usize = 3;

/// Reads a tab-delimited GPS trace, sorted ascending by timestamp.
pub fn read_gps_trace(path: impl AsRef<Path>) -> crate::Result<Vec<GpsPoint>> {
    parse_gps_trace(File::open(path).map_err(CodecError::Io)?)
}

/// Parses a tab-delimited GPS trace: one fix per row as date, time,
/// latitude, longitude. The header row is skipped; fixes are stably
/// sorted ascending by timestamp before they are returned.
pub fn parse_gps_trace(input: impl Read) -> crate::Result<Vec<GpsPoint>> {
    let mut rows = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(input);

    let mut points = Vec::new();
    for (row_index, row) in rows.records().enumerate() {
        let row = row.map_err(CodecError::Csv)?;
        let line = row_index + 2;

        let date = column(&row, line, DATE, "date")?;
        let time = column(&row, line, TIME, "time")?;
        let latitude = parse_number(column(&row, line, LATITUDE, "latitude")?, line)?;
        let longitude = parse_number(column(&row, line, LONGITUDE, "longitude")?, line)?;

        let stamp = format!("{date} {time}");
        let time = NaiveDateTime::parse_from_str(&stamp, TIME_FORMAT).map_err(|_| {
            CodecError::InvalidTimestamp { line, value: stamp }
        })?;

        points.push(GpsPoint::new(Point::new(longitude, latitude), time));
    }

    sort_by_time(&mut points);
    info!("Parsed {} GPS observations", points.len());

    Ok(points)
}

fn column<'r>(
    row: &'r csv::StringRecord,
    line: usize,
    index: usize,
    name: &'static str,
) -> Result<&'r str, CodecError> {
    row.get(index)
        .ok_or(CodecError::MissingField { line, field: name })
}

fn parse_number(value: &str, line: usize) -> Result<f64, CodecError> {
    value.trim().parse().map_err(|_| CodecError::InvalidNumber {
        line,
        value: value.to_string(),
    })
}
