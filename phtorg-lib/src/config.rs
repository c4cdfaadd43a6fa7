use std::path::PathBuf;

use chrono_tz::Tz;

/// Timezone used when none is configured.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Vancouver;

#[derive(Debug, Clone)]
pub struct OrganizerConfig {
    /// Root of the organized tree; files land in `dst_dir/YYYY/`.
    pub dst_dir: PathBuf,
    /// Civil timezone every resolved timestamp is expressed in.
    pub timezone: Tz,
    /// Size of the metadata extraction pool.
    pub workers: usize,
}

impl OrganizerConfig {
    pub fn new(dst_dir: impl Into<PathBuf>) -> Self {
        Self {
            dst_dir: dst_dir.into(),
            timezone: DEFAULT_TIMEZONE,
            workers: num_cpus::get(),
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Zero is treated as one worker.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}
