use std::{collections::HashMap, path::Path};

use chrono::{DateTime, NaiveDateTime, Utc};
use derive_more::Display;
use mediainfo::GeneralTrack;
use slog::{o, Discard, Logger};

use crate::Error;

/// Container fields that can carry the time a video was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ContainerDateField {
    /// Written by Apple devices, always with a UTC offset.
    #[display("com.apple.quicktime.creationdate")]
    AppleCreationDate,
    #[display("encoded date")]
    EncodedDate,
    #[display("tagged date")]
    TaggedDate,
}

impl ContainerDateField {
    pub const PRIORITY: [ContainerDateField; 3] = [
        ContainerDateField::AppleCreationDate,
        ContainerDateField::EncodedDate,
        ContainerDateField::TaggedDate,
    ];

    /// Matches a metadata key ignoring case and punctuation, so that
    /// `Encoded_Date` and `com_apple_quicktime_creationdate` are both found.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized: String = key
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "comapplequicktimecreationdate" => Some(Self::AppleCreationDate),
            "encodeddate" => Some(Self::EncodedDate),
            "taggeddate" => Some(Self::TaggedDate),
            _ => None,
        }
    }

    /// Whether values must be marked as UTC.
    pub fn is_utc_marked(self) -> bool {
        !matches!(self, Self::AppleCreationDate)
    }
}

/// Date fields found in a container, plus the names of everything else.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContainerFields {
    dates: HashMap<ContainerDateField, String>,
    others: Vec<String>,
}

impl ContainerFields {
    pub fn with_date(mut self, field: ContainerDateField, value: impl Into<String>) -> Self {
        self.dates.insert(field, value.into());
        self
    }

    pub fn with_other(mut self, name: impl Into<String>) -> Self {
        self.others.push(name.into());
        self
    }

    pub fn date(&self, field: ContainerDateField) -> Option<&str> {
        self.dates.get(&field).map(String::as_str)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .dates
            .keys()
            .map(ToString::to_string)
            .chain(self.others.iter().cloned())
            .collect();
        names.sort();
        names
    }
}

impl From<&GeneralTrack> for ContainerFields {
    fn from(track: &GeneralTrack) -> Self {
        track
            .iter()
            .fold(Self::default(), |fields, (key, value)| {
                match ContainerDateField::from_key(key) {
                    Some(field) => fields.with_date(field, value),
                    None => fields.with_other(key),
                }
            })
    }
}

/// Source of container metadata for a file.
pub trait ContainerReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<ContainerFields, Error>;
}

/// Shells out to the `mediainfo` tool.
#[derive(Clone)]
pub struct MediaInfoReader {
    logger: Logger,
}

impl MediaInfoReader {
    pub fn new() -> Self {
        Self {
            logger: Logger::root(Discard, o!()),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }
}

impl Default for MediaInfoReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerReader for MediaInfoReader {
    fn read(&self, path: &Path) -> Result<ContainerFields, Error> {
        let track = GeneralTrack::get(path, &self.logger)?;
        Ok(ContainerFields::from(&track))
    }
}

/// Removes the `UTC` prefix or suffix mediainfo puts on encoded and tagged dates.
pub fn strip_utc_marker(field: ContainerDateField, value: &str) -> Result<&str, Error> {
    let trimmed = value.trim();
    if !(trimmed.starts_with("UTC") || trimmed.ends_with("UTC")) {
        return Err(Error::MissingUtcMarker {
            field,
            value: value.to_string(),
        });
    }
    let trimmed = trimmed.strip_prefix("UTC").unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("UTC").unwrap_or(trimmed);
    Ok(trimmed.trim())
}

/// Parses an ISO 8601 style datetime. Values without an offset are UTC.
pub fn parse_container_datetime(value: &str) -> Result<DateTime<Utc>, Error> {
    const WITH_OFFSET: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f %z",
        "%Y-%m-%d %H:%M:%S%.f %z",
    ];
    const NAIVE: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Ok(t.with_timezone(&Utc));
    }
    for format in WITH_OFFSET {
        if let Ok(t) = DateTime::parse_from_str(value, format) {
            return Ok(t.with_timezone(&Utc));
        }
    }
    for format in NAIVE {
        if let Ok(t) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(t.and_utc());
        }
    }
    dateparser::parse_with_timezone(value, &Utc)
        .map_err(|_| Error::UnparseableDateTime(value.to_string()))
}
