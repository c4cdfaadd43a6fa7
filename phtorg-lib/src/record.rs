use std::{
    cmp::Ordering,
    path::{Path, PathBuf},
};

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use derive_more::Display;
use serde::Serialize;

use crate::Error;

/// How a candidate file's time taken is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FileCategory {
    ImageExif,
    VideoContainer,
    Screenshot,
    Generic,
}

/// Where a resolved timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize)]
pub enum TimestampSource {
    #[display("EXIF")]
    Exif,
    #[display("MediaInfo")]
    MediaContainer,
    #[display("mtime")]
    FileModifiedTime,
}

/// A point in time in the organizer's timezone, plus its provenance.
///
/// Values in different timezones are never ordered against each other:
/// `partial_cmp` returns `None` and they compare unequal.
#[derive(Debug, Clone)]
pub struct ResolvedTimestamp {
    instant: DateTime<Tz>,
    /// The same instant as the clock that recorded it read it.
    wall_clock: DateTime<FixedOffset>,
    source: TimestampSource,
}

impl ResolvedTimestamp {
    pub fn new(instant: DateTime<Tz>, source: TimestampSource) -> Self {
        Self {
            wall_clock: instant.fixed_offset(),
            instant,
            source,
        }
    }

    /// For clocks that disagree with the timezone's rules, such as a camera
    /// left on standard time across a DST change.
    pub fn from_wall_clock(
        wall_clock: DateTime<FixedOffset>,
        timezone: Tz,
        source: TimestampSource,
    ) -> Self {
        Self {
            instant: wall_clock.with_timezone(&timezone),
            wall_clock,
            source,
        }
    }

    pub fn instant(&self) -> &DateTime<Tz> {
        &self.instant
    }

    /// What filenames and exports show. Equal to the instant's local
    /// rendering except inside a DST gap.
    pub fn wall_clock(&self) -> &DateTime<FixedOffset> {
        &self.wall_clock
    }

    pub fn source(&self) -> TimestampSource {
        self.source
    }

    pub fn timezone(&self) -> Tz {
        self.instant.timezone()
    }

    pub fn check_timezone(&self, expected: Tz) -> Result<(), Error> {
        let found = self.timezone();
        if found != expected {
            return Err(Error::TimezoneMismatch { expected, found });
        }
        Ok(())
    }
}

impl PartialEq for ResolvedTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for ResolvedTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.timezone() != other.timezone() {
            return None;
        }
        Some(
            self.instant
                .cmp(&other.instant)
                .then(self.source.cmp(&other.source)),
        )
    }
}

/// Everything learned about one candidate file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub category: FileCategory,
    pub resolved: Option<ResolvedTimestamp>,
    /// Non-fatal problems met while resolving, in the order they happened.
    pub errors: Vec<String>,
}

impl FileRecord {
    pub fn resolved(
        path: PathBuf,
        category: FileCategory,
        resolved: ResolvedTimestamp,
        errors: Vec<String>,
    ) -> Self {
        Self {
            path,
            category,
            resolved: Some(resolved),
            errors,
        }
    }

    pub fn unresolved(path: PathBuf, category: FileCategory) -> Self {
        Self {
            path,
            category,
            resolved: None,
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameTask {
    pub source: FileRecord,
    pub destination: PathBuf,
}

impl RenameTask {
    pub fn sort_key(&self) -> &Path {
        &self.source.path
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedItem {
    pub source: FileRecord,
    pub reason: String,
}

impl SkippedItem {
    pub fn new(source: FileRecord, reason: impl Into<String>) -> Self {
        Self {
            source,
            reason: reason.into(),
        }
    }

    pub fn sort_key(&self) -> &Path {
        &self.source.path
    }

    /// The record's resolution errors followed by the skip reason.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.source
            .errors
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.reason.as_str()))
    }
}
