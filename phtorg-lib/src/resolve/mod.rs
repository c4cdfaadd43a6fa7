//! Working out when a file was taken.
//!
//! Each category has a fallback chain that ends in the file's modification
//! time, so a readable file always resolves. Missing metadata is recorded in
//! the record's `errors`; metadata that is present but inconsistent, or a
//! decoder failure, is returned as an error and the file is skipped.

use std::{fs, path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use slog::{debug, o, Discard, Logger};

use crate::{
    record::{FileCategory, FileRecord, ResolvedTimestamp, TimestampSource},
    Error,
};

pub use self::container::{
    parse_container_datetime, strip_utc_marker, ContainerDateField, ContainerFields,
    ContainerReader, MediaInfoReader,
};
pub use self::image::{
    localize, parse_exif_datetime, ExifDateTag, ExifReader, ExifTags, KamadakExifReader,
};

mod container;
mod image;

#[derive(Clone)]
pub struct Resolver {
    timezone: Tz,
    exif: Arc<dyn ExifReader>,
    /// `None` reads with mediainfo, logging through the resolver's logger.
    container: Option<Arc<dyn ContainerReader>>,
    logger: Logger,
}

impl Resolver {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            exif: Arc::new(KamadakExifReader),
            container: None,
            logger: Logger::root(Discard, o!()),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_exif_reader(mut self, reader: impl ExifReader + 'static) -> Self {
        self.exif = Arc::new(reader);
        self
    }

    pub fn with_container_reader(mut self, reader: impl ContainerReader + 'static) -> Self {
        self.container = Some(Arc::new(reader));
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn resolve(&self, path: &Path, category: FileCategory) -> Result<FileRecord, Error> {
        let (resolved, errors) = self.resolve_timestamp(path, category)?;
        Ok(FileRecord::resolved(
            path.to_path_buf(),
            category,
            resolved,
            errors,
        ))
    }

    /// The timestamp for `path` along with the reasons for any fallback.
    pub fn resolve_timestamp(
        &self,
        path: &Path,
        category: FileCategory,
    ) -> Result<(ResolvedTimestamp, Vec<String>), Error> {
        let mut errors = Vec::new();
        let resolved = match category {
            FileCategory::ImageExif => self.exif_time(path, &mut errors)?,
            FileCategory::VideoContainer => self.container_time(path, &mut errors)?,
            FileCategory::Screenshot | FileCategory::Generic => self.modified_time(path)?,
        };
        resolved.check_timezone(self.timezone)?;
        for error in &errors {
            debug!(self.logger, "fell back to modified time";
                "path" => path.display(),
                "reason" => error,
            );
        }
        Ok((resolved, errors))
    }

    fn modified_time(&self, path: &Path) -> Result<ResolvedTimestamp, Error> {
        let modified = fs::metadata(path)?.modified()?;
        let instant = DateTime::<Utc>::from(modified).with_timezone(&self.timezone);
        Ok(ResolvedTimestamp::new(instant, TimestampSource::FileModifiedTime))
    }

    fn exif_time(&self, path: &Path, errors: &mut Vec<String>) -> Result<ResolvedTimestamp, Error> {
        let tags = match self.exif.read(path)? {
            Some(tags) if !tags.is_empty() => tags,
            _ => {
                errors.push("File is EXIF-compatible but no EXIF found".to_string());
                return self.modified_time(path);
            }
        };

        let found = ExifDateTag::PRIORITY
            .iter()
            .find_map(|&tag| tags.date(tag).filter(|value| !is_blank(value)));
        match found {
            Some(value) => Ok(ResolvedTimestamp::from_wall_clock(
                localize(parse_exif_datetime(value)?, self.timezone),
                self.timezone,
                TimestampSource::Exif,
            )),
            None => {
                errors.push(format!(
                    "EXIF exists but no datetime found: {}",
                    tags.names().join(", ")
                ));
                self.modified_time(path)
            }
        }
    }

    fn container_time(
        &self,
        path: &Path,
        errors: &mut Vec<String>,
    ) -> Result<ResolvedTimestamp, Error> {
        let fields = match &self.container {
            Some(reader) => reader.read(path)?,
            None => MediaInfoReader::new()
                .with_logger(self.logger.clone())
                .read(path)?,
        };
        let found = ContainerDateField::PRIORITY
            .iter()
            .find_map(|&field| {
                fields
                    .date(field)
                    .filter(|value| !is_blank(value))
                    .map(|value| (field, value))
            });
        let Some((field, value)) = found else {
            errors.push(format!(
                "Cannot extract datetime from container metadata: {}",
                fields.names().join(", ")
            ));
            return self.modified_time(path);
        };

        let value = if field.is_utc_marked() {
            strip_utc_marker(field, value)?
        } else {
            value
        };
        let instant = parse_container_datetime(value)?.with_timezone(&self.timezone);
        Ok(ResolvedTimestamp::new(instant, TimestampSource::MediaContainer))
    }
}

/// Empty values are written by some cameras and editors in place of a date.
fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
