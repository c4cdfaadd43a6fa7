//! Finding and classifying the files to organize.

use std::path::{Path, PathBuf};

use slog::{debug, warn, Logger};
use walkdir::WalkDir;

use crate::{record::FileCategory, Error};

pub const EXIF_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "heic"];
pub const CONTAINER_EXTENSIONS: [&str; 3] = ["mov", "mp4", "m4v"];
pub const SCREENSHOT_EXTENSIONS: [&str; 4] = ["png", "gif", "bmp", "webp"];
/// Files directly inside a directory with this name are screenshots.
pub const SCREENSHOTS_DIR: &str = "Screenshots";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Candidate {
    pub path: PathBuf,
    pub category: FileCategory,
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Returns `None` for files that are not organized at all.
pub fn classify(path: &Path) -> Option<FileCategory> {
    let ext = lowercase_extension(path)?;
    let ext = ext.as_str();
    if EXIF_EXTENSIONS.contains(&ext) {
        Some(FileCategory::ImageExif)
    } else if CONTAINER_EXTENSIONS.contains(&ext) {
        Some(FileCategory::VideoContainer)
    } else if SCREENSHOT_EXTENSIONS.contains(&ext) {
        Some(FileCategory::Screenshot)
    } else {
        None
    }
}

/// Screenshots are recognized by extension or by living in a `Screenshots`
/// directory, even when their format carries EXIF.
pub fn is_screenshot(path: &Path) -> bool {
    let by_extension = lowercase_extension(path)
        .is_some_and(|ext| SCREENSHOT_EXTENSIONS.contains(&ext.as_str()));
    let by_directory = path
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name == SCREENSHOTS_DIR);
    by_extension || by_directory
}

/// Walks `root` (or takes it as-is when it is a file) and returns the
/// organizable files sorted by path without duplicates.
pub fn candidates(root: &Path, logger: &Logger) -> Result<Vec<Candidate>, Error> {
    let paths = if root.is_file() {
        vec![root.to_path_buf()]
    } else {
        if !root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a file or directory", root.display()),
            )
            .into());
        }
        let mut paths = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(logger, "unable to read directory entry"; "error" => e.to_string());
                    continue;
                }
            };
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }
        paths
    };

    let mut candidates: Vec<Candidate> = paths
        .into_iter()
        .filter_map(|path| match classify(&path) {
            Some(category) => Some(Candidate { path, category }),
            None => {
                debug!(logger, "ignoring file"; "path" => path.display());
                None
            }
        })
        .collect();
    candidates.sort();
    candidates.dedup();
    Ok(candidates)
}
