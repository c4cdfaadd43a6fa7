use serde::Serialize;

use crate::record::{RenameTask, SkippedItem};

/// Rendering of resolved instants in previews and exports.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// One line of the rename preview, in export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameTaskRow {
    pub src: String,
    pub datetime: String,
    pub datetime_source: String,
    pub dst: String,
}

impl RenameTaskRow {
    pub const HEADER: [&'static str; 4] = ["src", "datetime", "datetime_source", "dst"];

    pub fn cells(&self) -> [&str; 4] {
        [&self.src, &self.datetime, &self.datetime_source, &self.dst]
    }
}

impl From<&RenameTask> for RenameTaskRow {
    fn from(task: &RenameTask) -> Self {
        let (datetime, datetime_source) = match &task.source.resolved {
            Some(resolved) => (
                resolved.wall_clock().format(DATETIME_FORMAT).to_string(),
                resolved.source().to_string(),
            ),
            None => (String::new(), String::new()),
        };
        Self {
            src: task.source.path.display().to_string(),
            datetime,
            datetime_source,
            dst: task.destination.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItemRow {
    pub src: String,
    /// Every error for the file, joined with `"; "`.
    pub errors: String,
}

impl SkippedItemRow {
    pub const HEADER: [&'static str; 2] = ["src", "errors"];

    pub fn cells(&self) -> [&str; 2] {
        [&self.src, &self.errors]
    }
}

impl From<&SkippedItem> for SkippedItemRow {
    fn from(item: &SkippedItem) -> Self {
        Self {
            src: item.source.path.display().to_string(),
            errors: item.errors().collect::<Vec<_>>().join("; "),
        }
    }
}
