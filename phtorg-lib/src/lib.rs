//! Plans the renaming of photos and videos into a year-bucketed tree, with
//! filenames derived from the time each file was taken and its content hash.

use std::path::Path;

use chrono_tz::Tz;
use displaydoc::Display;
use thiserror::Error;

pub mod config;
pub mod discover;
pub mod fingerprint;
pub mod organizer;
pub mod plan;
pub mod planner;
pub mod record;
pub mod resolve;
pub mod schedule;

pub use config::OrganizerConfig;
pub use organizer::Organizer;
pub use plan::Plan;
pub use schedule::{CancelFlag, Progress};

use resolve::ContainerDateField;

#[derive(Debug, Error, Display)]
pub enum Error {
    /// io: {0}
    Io(#[from] std::io::Error),
    /// exif: {0}
    Exif(#[from] exif::Error),
    /// mediainfo: {0}
    MediaInfo(#[from] mediainfo::Error),
    /// walkdir: {0}
    Walkdir(#[from] walkdir::Error),
    /// unable to build worker pool: {0}
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// {field} should have UTC marking: {value}
    MissingUtcMarker {
        field: ContainerDateField,
        value: String,
    },
    /// unable to parse datetime: {0}
    UnparseableDateTime(String),
    /// timezone does not match: expected {expected}, found {found}
    TimezoneMismatch { expected: Tz, found: Tz },
    /// invalid fingerprint: {0}
    InvalidFingerprint(String),
    /// destination already exists: {0}
    DestinationExists(String),
    /// worker panicked: {0}
    WorkerPanicked(String),
}

impl Error {
    pub(crate) fn destination_exists(path: &Path) -> Self {
        Error::DestinationExists(path.display().to_string())
    }
}
