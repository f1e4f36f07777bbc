//! Accident and hotspot file readers.
//!
//! Accident files are parsed row by row: a row that cannot be turned into an
//! [`AccidentRecord`] becomes a [`Rejection`] and the rest of the file is
//! still read. Only unreadable files and malformed documents are errors.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use roadrisk_core::{
    parse_timestamp, AccidentRecord, Hotspot, Rejection, Severity, ValidationError,
};
use serde::de::{DeserializeOwned, Error as _};
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

/// Supported input formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// A JSON array of objects.
    Json,
    /// A CSV file with a header row.
    Csv,
}

impl DataFormat {
    /// Detects the format of `path` from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for anything but `.json` and `.csv`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Accident records read from a file, with the rows that failed to parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedAccidents {
    /// Successfully parsed records, in file order.
    pub records: Vec<AccidentRecord>,
    /// Rows that could not be parsed.
    pub rejected: Vec<Rejection>,
}

impl ParsedAccidents {
    fn push(&mut self, row: std::result::Result<AccidentRecord, Rejection>) {
        match row {
            Ok(record) => self.records.push(record),
            Err(rejection) => {
                log::warn!(
                    "rejecting accident row {}: {}",
                    rejection.record_id,
                    rejection.reason
                );
                self.rejected.push(rejection);
            }
        }
    }
}

/// Hotspots read from a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedHotspots {
    /// Hotspots that deserialized cleanly, in file order.
    pub hotspots: Vec<Hotspot>,
    /// Entries skipped because they did not deserialize.
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

#[derive(Debug, Default, Deserialize)]
struct RawAccident {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    accident_time: Option<String>,
    #[serde(default)]
    weather_condition: Option<String>,
}

impl RawAccident {
    fn into_record(self, position: usize) -> std::result::Result<AccidentRecord, Rejection> {
        let id = match self.id {
            Some(RawId::Text(id)) if !id.trim().is_empty() => id,
            Some(RawId::Number(id)) => id.to_string(),
            _ => return Err(reject_row(position, missing("id"))),
        };
        let reject = |reason| Rejection {
            record_id: id.clone(),
            reason,
        };

        let latitude = self.latitude.ok_or_else(|| reject(missing("latitude")))?;
        let longitude = self.longitude.ok_or_else(|| reject(missing("longitude")))?;
        let severity = self
            .severity
            .as_deref()
            .ok_or_else(|| reject(missing("severity")))?
            .parse::<Severity>()
            .map_err(reject)?;
        let accident_time = match self.accident_time.as_deref().map(str::trim) {
            Some(time) if !time.is_empty() => {
                Some(parse_timestamp(time, "accident_time").map_err(reject)?)
            }
            _ => None,
        };
        let weather_condition = self
            .weather_condition
            .map(|weather| weather.trim().to_string())
            .filter(|weather| !weather.is_empty());

        Ok(AccidentRecord {
            id,
            latitude,
            longitude,
            severity,
            accident_time,
            weather_condition,
        })
    }
}

fn missing(field: &str) -> ValidationError {
    ValidationError::MissingField(field.to_string())
}

fn reject_row(position: usize, reason: ValidationError) -> Rejection {
    Rejection {
        record_id: format!("#{position}"),
        reason,
    }
}

fn unparseable(position: usize, err: &impl std::fmt::Display) -> Rejection {
    reject_row(
        position,
        ValidationError::InvalidField {
            field: "row".to_string(),
            value: err.to_string(),
        },
    )
}

/// Reads accident records from a `.json` or `.csv` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has an unsupported
/// extension, or is not a JSON array / CSV document at all.
pub fn read_accidents<P: AsRef<Path>>(path: P) -> Result<ParsedAccidents> {
    let path = path.as_ref();
    let parsed = match DataFormat::from_path(path)? {
        DataFormat::Json => parse_accidents_json(&fs::read_to_string(path)?)?,
        DataFormat::Csv => parse_accidents_csv(BufReader::new(File::open(path)?))?,
    };
    log::debug!(
        "read {} accident records from {} ({} rejected)",
        parsed.records.len(),
        path.display(),
        parsed.rejected.len()
    );
    Ok(parsed)
}

/// Parses a JSON array of accident objects.
///
/// Numeric ids are accepted and converted to strings.
///
/// # Errors
///
/// Returns [`Error::Json`] if the document is not a JSON array.
pub fn parse_accidents_json(text: &str) -> Result<ParsedAccidents> {
    let rows: Vec<Value> = serde_json::from_str(text)?;
    let mut parsed = ParsedAccidents::default();
    for (position, row) in rows.into_iter().enumerate() {
        let record = RawAccident::deserialize(row)
            .map_err(|err| unparseable(position, &err))
            .and_then(|raw| raw.into_record(position));
        parsed.push(record);
    }
    Ok(parsed)
}

/// Parses CSV accident data with a header row naming the columns.
///
/// Missing optional columns and empty cells are treated as absent.
///
/// # Errors
///
/// Returns [`Error::Csv`] if the underlying reader fails or the header row
/// cannot be read.
pub fn parse_accidents_csv<R: Read>(reader: R) -> Result<ParsedAccidents> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    reader.headers()?;

    let mut parsed = ParsedAccidents::default();
    for (position, row) in reader.deserialize::<RawAccident>().enumerate() {
        let record = match row {
            Ok(raw) => raw.into_record(position),
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => Err(unparseable(position, &err)),
        };
        parsed.push(record);
    }
    Ok(parsed)
}

/// Reads hotspots from a JSON file.
///
/// Accepts either a bare array of hotspots or an object with a `hotspots`
/// array, as written by a detection run. Entries that fail to deserialize
/// are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds neither shape.
pub fn read_hotspots<P: AsRef<Path>>(path: P) -> Result<LoadedHotspots> {
    let path = path.as_ref();
    let loaded = parse_hotspots_json(&fs::read_to_string(path)?)?;
    log::debug!(
        "read {} hotspots from {} ({} skipped)",
        loaded.hotspots.len(),
        path.display(),
        loaded.skipped
    );
    Ok(loaded)
}

/// Parses hotspots from JSON text; see [`read_hotspots`].
///
/// # Errors
///
/// Returns [`Error::Json`] for malformed JSON or an unexpected shape.
pub fn parse_hotspots_json(text: &str) -> Result<LoadedHotspots> {
    let entries = match serde_json::from_str::<Value>(text)? {
        Value::Array(entries) => entries,
        Value::Object(mut document) => match document.remove("hotspots") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(missing_hotspots()),
        },
        _ => return Err(missing_hotspots()),
    };

    let mut loaded = LoadedHotspots::default();
    for (position, entry) in entries.into_iter().enumerate() {
        match Hotspot::deserialize(entry) {
            Ok(hotspot) => loaded.hotspots.push(hotspot),
            Err(err) => {
                log::warn!("skipping hotspot entry #{position}: {err}");
                loaded.skipped += 1;
            }
        }
    }
    Ok(loaded)
}

fn missing_hotspots() -> Error {
    Error::Json(serde_json::Error::custom(
        "expected a hotspot array or an object with a \"hotspots\" array",
    ))
}

/// Reads any JSON document into `T`, e.g. a configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not match `T`.
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::Builder;

    const CSV: &str = "\
id,latitude,longitude,severity,accident_time,weather_condition
a1,10.0,20.0,minor,2024-01-01T08:30:00,Rain
a2,10.001,20.0,Major,2024-01-01 17:05:00,
a3,10.0,20.001,dangerous,,
a4,abc,20.0,minor,,
,10.0,20.0,minor,,
a6,10.0,20.0,severe,,
a7,10.0,20.0,minor,yesterday,
";

    #[test]
    fn test_parse_csv() {
        let parsed = parse_accidents_csv(CSV.as_bytes()).unwrap();
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.rejected.len(), 4);

        let first = &parsed.records[0];
        assert_eq!(first.id, "a1");
        assert_eq!(first.severity, Severity::Minor);
        assert_eq!(
            first.accident_time,
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(8, 30, 0)
        );
        assert_eq!(first.weather_condition.as_deref(), Some("Rain"));

        assert_eq!(parsed.records[1].severity, Severity::Major);
        assert!(parsed.records[1].weather_condition.is_none());
        assert!(parsed.records[2].accident_time.is_none());

        let ids: Vec<&str> = parsed
            .rejected
            .iter()
            .map(|r| r.record_id.as_str())
            .collect();
        assert_eq!(ids, vec!["#3", "#4", "a6", "a7"]);
        assert_eq!(parsed.rejected[1].reason, missing("id"));
    }

    #[test]
    fn test_parse_json_with_numeric_ids() {
        let text = r#"[
            {"id": 7, "latitude": 10.0, "longitude": 20.0, "severity": "major"},
            {"id": "b", "latitude": 10.0, "severity": "minor"},
            {"id": "c", "latitude": "north", "longitude": 20.0, "severity": "minor"}
        ]"#;
        let parsed = parse_accidents_json(text).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].id, "7");
        assert_eq!(parsed.rejected.len(), 2);
        assert_eq!(parsed.rejected[0].record_id, "b");
        assert_eq!(parsed.rejected[0].reason, missing("longitude"));
        assert_eq!(parsed.rejected[1].record_id, "#2");
    }

    #[test]
    fn test_json_must_be_array() {
        assert!(matches!(
            parse_accidents_json(r#"{"id": 1}"#),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_read_accidents_by_extension() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let parsed = read_accidents(file.path()).unwrap();
        assert_eq!(parsed.records.len(), 3);

        let other = Builder::new().suffix(".parquet").tempfile().unwrap();
        assert!(matches!(
            read_accidents(other.path()),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_hotspots_skip_malformed_entries() {
        let text = r#"{"hotspots": [{"cluster_id": "x"}], "noise_count": 3}"#;
        let loaded = parse_hotspots_json(text).unwrap();
        assert!(loaded.hotspots.is_empty());
        assert_eq!(loaded.skipped, 1);

        assert!(parse_hotspots_json(r#"{"alerts": []}"#).is_err());
        assert!(parse_hotspots_json("42").is_err());
    }
}
