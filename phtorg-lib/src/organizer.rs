use std::{fs, path::Path, sync::Arc};

use slog::{debug, info, o, warn, Discard, Logger};

use crate::{
    config::OrganizerConfig,
    discover::{self, Candidate},
    fingerprint::Fingerprint,
    plan::{Aggregator, Plan},
    planner::Planner,
    record::{FileRecord, RenameTask},
    resolve::{ContainerReader, ExifReader, Resolver},
    schedule::{CancelFlag, Progress, Scheduler},
    Error,
};

#[cfg(test)]
mod tests;

/// Plans and applies the organization of a source tree into `dst_dir`.
pub struct Organizer {
    config: OrganizerConfig,
    resolver: Resolver,
    logger: Logger,
}

impl Organizer {
    pub fn new(config: OrganizerConfig) -> Self {
        let resolver = Resolver::new(config.timezone);
        Self {
            config,
            resolver,
            logger: Logger::root(Discard, o!()),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.resolver = self.resolver.with_logger(logger.clone());
        self.logger = logger;
        self
    }

    pub fn with_exif_reader(mut self, reader: impl ExifReader + 'static) -> Self {
        self.resolver = self.resolver.with_exif_reader(reader);
        self
    }

    pub fn with_container_reader(mut self, reader: impl ContainerReader + 'static) -> Self {
        self.resolver = self.resolver.with_container_reader(reader);
        self
    }

    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    /// Works out where every file under `src` should go.
    ///
    /// `progress` is called after each file with a monotonically increasing
    /// count. When `cancel` is set the plan covers only the files completed
    /// so far and is marked as cancelled.
    pub fn plan<P>(&self, src: &Path, cancel: &CancelFlag, mut progress: P) -> Result<Plan, Error>
    where
        P: FnMut(Progress),
    {
        let candidates = discover::candidates(src, &self.logger)?;
        info!(self.logger, "discovered files";
            "src" => src.display(),
            "count" => candidates.len(),
        );

        let scheduler = Scheduler::new(self.config.workers)?.with_logger(self.logger.clone());
        let resolver = Arc::new(self.resolver.clone());
        let planner = Planner::new(&self.config.dst_dir);
        let mut aggregator = Aggregator::new().with_logger(self.logger.clone());
        let summary = scheduler.run(
            candidates,
            move |candidate| plan_file(&resolver, &planner, candidate),
            cancel,
            |completion, p| {
                aggregator.push(completion);
                progress(p);
            },
        );

        let plan = aggregator.finish(summary);
        if plan.cancelled {
            warn!(self.logger, "planning cancelled";
                "completed" => plan.completed,
                "total" => plan.total,
            );
        }
        info!(self.logger, "collected rename tasks"; "count" => plan.rename_tasks.len());
        info!(self.logger, "collected skipped items"; "count" => plan.skipped_items.len());
        Ok(plan)
    }

    /// Moves every accepted file into place, creating year directories as
    /// needed. Stops at the first failure.
    pub fn commit<P>(&self, plan: &Plan, mut progress: P) -> Result<usize, Error>
    where
        P: FnMut(Progress),
    {
        let total = plan.rename_tasks.len();
        for (i, task) in plan.rename_tasks.iter().enumerate() {
            if let Some(parent) = task.destination.parent() {
                fs::create_dir_all(parent)?;
            }
            // rename(2) silently replaces an existing file.
            if task.destination.exists() {
                return Err(Error::destination_exists(&task.destination));
            }
            fs::rename(&task.source.path, &task.destination)?;
            debug!(self.logger, "renamed";
                "src" => task.source.path.display(),
                "dst" => task.destination.display(),
            );
            progress(Progress {
                completed: i + 1,
                total,
            });
        }
        info!(self.logger, "renamed files"; "count" => total);
        Ok(total)
    }
}

/// Resolver, fingerprinter and planner for one file.
fn plan_file(
    resolver: &Resolver,
    planner: &Planner,
    candidate: &Candidate,
) -> Result<RenameTask, Error> {
    let Candidate { path, category } = candidate;
    let (resolved, errors) = resolver.resolve_timestamp(path, *category)?;
    let fingerprint = Fingerprint::of_file(path)?;
    let destination = planner.plan(path, *category, &resolved, &fingerprint);
    Ok(RenameTask {
        source: FileRecord::resolved(path.clone(), *category, resolved, errors),
        destination,
    })
}
