//! Collecting per-file outcomes into the final rename plan.

use std::{collections::HashMap, path::PathBuf};

use same_file::is_same_file;
use slog::{debug, error, o, Discard, Logger};

use crate::{
    record::{FileRecord, RenameTask, SkippedItem},
    schedule::{Completion, RunSummary},
};

pub use self::rows::{RenameTaskRow, SkippedItemRow};
pub use self::stats::Stats;

mod rows;
mod stats;

#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Sorted by source path.
    pub rename_tasks: Vec<RenameTask>,
    /// Sorted by source path.
    pub skipped_items: Vec<SkippedItem>,
    /// Files whose destination is already the file itself.
    pub already_organized: Vec<PathBuf>,
    pub total: usize,
    pub completed: usize,
    pub cancelled: bool,
}

impl Plan {
    pub fn stats(&self) -> Stats {
        Stats::from(self)
    }
}

/// Sorts scheduler completions into accepted tasks, skipped items and no-ops.
///
/// Only the coordinating thread pushes, so no locking is involved.
pub struct Aggregator {
    rename_tasks: Vec<RenameTask>,
    skipped_items: Vec<SkippedItem>,
    already_organized: Vec<PathBuf>,
    logger: Logger,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            rename_tasks: Vec::new(),
            skipped_items: Vec::new(),
            already_organized: Vec::new(),
            logger: Logger::root(Discard, o!()),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn push(&mut self, completion: Completion) {
        let Completion { candidate, outcome } = completion;
        match outcome {
            Ok(task) => self.accept(task),
            Err(e) => {
                error!(self.logger, "failed to plan file";
                    "path" => candidate.path.display(),
                    "error" => e.to_string(),
                );
                let record = FileRecord::unresolved(candidate.path, candidate.category);
                self.skipped_items.push(SkippedItem::new(record, e.to_string()));
            }
        }
    }

    fn accept(&mut self, task: RenameTask) {
        if !task.destination.exists() {
            self.rename_tasks.push(task);
            return;
        }
        match is_same_file(&task.destination, &task.source.path) {
            Ok(true) => {
                debug!(self.logger, "already organized"; "path" => task.source.path.display());
                self.already_organized.push(task.source.path);
            }
            Ok(false) => {
                let reason = format!("Destination already exists: {}", task.destination.display());
                self.skipped_items.push(SkippedItem::new(task.source, reason));
            }
            Err(e) => {
                let reason = format!(
                    "Unable to compare with destination {}: {}",
                    task.destination.display(),
                    e
                );
                self.skipped_items.push(SkippedItem::new(task.source, reason));
            }
        }
    }

    /// Skips every task whose destination is shared with another task.
    fn reject_collisions(&mut self) {
        let mut sources_by_destination: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
        for task in &self.rename_tasks {
            sources_by_destination
                .entry(task.destination.clone())
                .or_default()
                .push(task.source.path.clone());
        }

        let (colliding, unique): (Vec<_>, Vec<_>) = std::mem::take(&mut self.rename_tasks)
            .into_iter()
            .partition(|task| sources_by_destination[&task.destination].len() > 1);
        self.rename_tasks = unique;
        for task in colliding {
            let mut others: Vec<String> = sources_by_destination[&task.destination]
                .iter()
                .filter(|source| **source != task.source.path)
                .map(|source| source.display().to_string())
                .collect();
            others.sort();
            let reason = format!(
                "Destination {} is also planned for {}",
                task.destination.display(),
                others.join(", ")
            );
            self.skipped_items.push(SkippedItem::new(task.source, reason));
        }
    }

    pub fn finish(mut self, summary: RunSummary) -> Plan {
        self.reject_collisions();
        self.rename_tasks.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        self.skipped_items.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        self.already_organized.sort();
        Plan {
            rename_tasks: self.rename_tasks,
            skipped_items: self.skipped_items,
            already_organized: self.already_organized,
            total: summary.total,
            completed: summary.completed,
            cancelled: summary.cancelled,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}
