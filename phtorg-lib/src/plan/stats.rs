use std::collections::BTreeMap;

use serde::Serialize;

use super::Plan;

/// Key used for files that never got a timestamp.
pub const UNRESOLVED: &str = "unresolved";

/// Counts describing a plan, for the end-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub cancelled: bool,
    pub accepted: usize,
    pub skipped: usize,
    pub already_organized: usize,
    /// Accepted and skipped files by timestamp provenance.
    pub count_by_source: BTreeMap<String, usize>,
}

impl From<&Plan> for Stats {
    fn from(plan: &Plan) -> Self {
        let mut count_by_source = BTreeMap::new();
        let records = plan
            .rename_tasks
            .iter()
            .map(|task| &task.source)
            .chain(plan.skipped_items.iter().map(|item| &item.source));
        for record in records {
            let key = match &record.resolved {
                Some(resolved) => resolved.source().to_string(),
                None => UNRESOLVED.to_string(),
            };
            *count_by_source.entry(key).or_default() += 1;
        }
        Stats {
            total: plan.total,
            completed: plan.completed,
            cancelled: plan.cancelled,
            accepted: plan.rename_tasks.len(),
            skipped: plan.skipped_items.len(),
            already_organized: plan.already_organized.len(),
            count_by_source,
        }
    }
}
