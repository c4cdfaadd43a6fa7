use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;
use derive_more::Display;
use exif::{In, Tag, Value};

use crate::Error;

/// EXIF tags that can carry the time a photo was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ExifDateTag {
    DateTimeOriginal,
    DateTimeDigitized,
    DateTime,
}

impl ExifDateTag {
    /// Search order, most trustworthy first.
    pub const PRIORITY: [ExifDateTag; 3] = [
        ExifDateTag::DateTimeOriginal,
        ExifDateTag::DateTimeDigitized,
        ExifDateTag::DateTime,
    ];

    pub fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::DateTimeOriginal => Some(Self::DateTimeOriginal),
            Tag::DateTimeDigitized => Some(Self::DateTimeDigitized),
            Tag::DateTime => Some(Self::DateTime),
            _ => None,
        }
    }
}

/// The parts of an EXIF block the resolver cares about.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExifTags {
    dates: HashMap<ExifDateTag, String>,
    others: Vec<String>,
}

impl ExifTags {
    pub fn with_date(mut self, tag: ExifDateTag, value: impl Into<String>) -> Self {
        self.dates.insert(tag, value.into());
        self
    }

    pub fn with_other(mut self, name: impl Into<String>) -> Self {
        self.others.push(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.others.is_empty()
    }

    pub fn date(&self, tag: ExifDateTag) -> Option<&str> {
        self.dates.get(&tag).map(String::as_str)
    }

    /// Names of every tag present, sorted.
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

/// Source of EXIF tags for a file.
pub trait ExifReader: Send + Sync {
    /// `Ok(None)` when the file simply has no EXIF block.
    fn read(&self, path: &Path) -> Result<Option<ExifTags>, Error>;
}

/// Reads EXIF in process with kamadak-exif.
#[derive(Debug, Default, Clone, Copy)]
pub struct KamadakExifReader;

impl ExifReader for KamadakExifReader {
    fn read(&self, path: &Path) -> Result<Option<ExifTags>, Error> {
        let file = File::open(path)?;
        let mut bufreader = BufReader::new(&file);
        let exif = match exif::Reader::new().read_from_container(&mut bufreader) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut tags = ExifTags::default();
        for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
            match (ExifDateTag::from_tag(field.tag), &field.value) {
                (Some(date_tag), Value::Ascii(values)) => {
                    if let Some(first) = values.first() {
                        tags = tags.with_date(date_tag, String::from_utf8_lossy(first));
                    }
                }
                // Opaque byte blobs (maker notes and the like) are not tags worth reporting.
                (_, Value::Undefined(..)) => (),
                _ => tags = tags.with_other(field.tag.to_string()),
            }
        }
        Ok(Some(tags))
    }
}

/// Parses an EXIF `YYYY:MM:DD HH:MM:SS` value into a wall-clock time.
///
/// Anything after the first 19 characters is dropped: some software pads the
/// value with non-ASCII bytes.
pub fn parse_exif_datetime(value: &str) -> Result<NaiveDateTime, Error> {
    let truncated: String = value.chars().take(19).collect();
    let iso = truncated.replacen(':', "-", 2);
    NaiveDateTime::parse_from_str(&iso, "%Y-%m-%d %H:%M:%S")
        .map_err(|_| Error::UnparseableDateTime(value.to_string()))
}

/// Attaches the UTC offset `timezone` had at wall-clock time `naive`.
///
/// Ambiguous times (the repeated hour when DST ends) take standard time, the
/// later of the two instants. Times skipped when DST starts keep the offset
/// from before the jump, so the wall-clock reading is preserved.
pub fn localize(naive: NaiveDateTime, timezone: Tz) -> DateTime<FixedOffset> {
    let offset = match timezone.offset_from_local_datetime(&naive) {
        LocalResult::Single(offset) => offset.fix(),
        LocalResult::Ambiguous(_, standard) => standard.fix(),
        LocalResult::None => timezone
            .offset_from_local_datetime(&(naive - TimeDelta::days(1)))
            .earliest()
            .unwrap_or_else(|| timezone.offset_from_utc_datetime(&naive))
            .fix(),
    };
    let utc = naive - TimeDelta::seconds(offset.local_minus_utc().into());
    DateTime::from_naive_utc_and_offset(utc, offset)
}
