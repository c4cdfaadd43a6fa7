use std::path::{Path, PathBuf};

use crate::{
    discover,
    fingerprint::Fingerprint,
    record::{FileCategory, ResolvedTimestamp},
};

pub const DEFAULT_PREFIX: &str = "IMG_";
pub const SCREENSHOT_PREFIX: &str = "SCR_";

/// `{prefix}{YYYYMMDD_HHMMSS}_{fingerprint}{.ext}` with the extension lowercased.
pub fn filename(
    path: &Path,
    resolved: &ResolvedTimestamp,
    fingerprint: &Fingerprint,
    prefix: &str,
) -> String {
    let timestamp = resolved.wall_clock().format("%Y%m%d_%H%M%S");
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    format!("{prefix}{timestamp}_{fingerprint}{extension}")
}

/// Maps a resolved file onto its place in the organized tree.
#[derive(Debug, Clone)]
pub struct Planner {
    dst_dir: PathBuf,
}

impl Planner {
    pub fn new(dst_dir: impl Into<PathBuf>) -> Self {
        Self {
            dst_dir: dst_dir.into(),
        }
    }

    pub fn dst_dir(&self) -> &Path {
        &self.dst_dir
    }

    pub fn plan(
        &self,
        path: &Path,
        category: FileCategory,
        resolved: &ResolvedTimestamp,
        fingerprint: &Fingerprint,
    ) -> PathBuf {
        let prefix = if category == FileCategory::Screenshot || discover::is_screenshot(path) {
            SCREENSHOT_PREFIX
        } else {
            DEFAULT_PREFIX
        };
        let year = resolved.wall_clock().format("%Y").to_string();
        self.dst_dir
            .join(year)
            .join(filename(path, resolved, fingerprint, prefix))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use chrono_tz::America::Vancouver;

    use super::*;
    use crate::record::TimestampSource;

    fn resolved() -> ResolvedTimestamp {
        ResolvedTimestamp::new(
            Vancouver.with_ymd_and_hms(2021, 3, 15, 10, 20, 30).unwrap(),
            TimestampSource::Exif,
        )
    }

    fn fingerprint() -> Fingerprint {
        "abc1234".parse().unwrap()
    }

    #[test]
    fn image_destination() {
        let planner = Planner::new("/dst");
        let destination = planner.plan(
            Path::new("/src/IMG_1234.jpg"),
            FileCategory::ImageExif,
            &resolved(),
            &fingerprint(),
        );
        assert_eq!(
            destination,
            PathBuf::from("/dst/2021/IMG_20210315_102030_abc1234.jpg")
        );
    }

    #[test]
    fn name_follows_the_wall_clock() {
        let wall_clock = FixedOffset::west_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2021, 3, 14, 2, 30, 0)
            .unwrap();
        let resolved =
            ResolvedTimestamp::from_wall_clock(wall_clock, Vancouver, TimestampSource::Exif);
        let destination = Planner::new("/dst").plan(
            Path::new("/src/IMG_1.jpg"),
            FileCategory::ImageExif,
            &resolved,
            &fingerprint(),
        );
        assert_eq!(
            destination,
            PathBuf::from("/dst/2021/IMG_20210314_023000_abc1234.jpg")
        );
    }

    #[test]
    fn screenshot_prefix() {
        let planner = Planner::new("/dst");
        let by_category = planner.plan(
            Path::new("/src/capture.PNG"),
            FileCategory::Screenshot,
            &resolved(),
            &fingerprint(),
        );
        assert_eq!(
            by_category,
            PathBuf::from("/dst/2021/SCR_20210315_102030_abc1234.png")
        );

        let by_directory = planner.plan(
            Path::new("/src/Screenshots/IMG_9.JPEG"),
            FileCategory::ImageExif,
            &resolved(),
            &fingerprint(),
        );
        assert_eq!(
            by_directory,
            PathBuf::from("/dst/2021/SCR_20210315_102030_abc1234.jpeg")
        );
    }

    #[test]
    fn deterministic() {
        let planner = Planner::new("/dst");
        let path = Path::new("/src/clip.MOV");
        let first = planner.plan(path, FileCategory::VideoContainer, &resolved(), &fingerprint());
        let second = planner.plan(path, FileCategory::VideoContainer, &resolved(), &fingerprint());
        assert_eq!(first, second);
    }

    #[test]
    fn no_extension() {
        assert_eq!(
            filename(Path::new("raw"), &resolved(), &fingerprint(), DEFAULT_PREFIX),
            "IMG_20210315_102030_abc1234"
        );
    }
}
