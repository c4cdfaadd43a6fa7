use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use phtorg_lib::{
    plan::{RenameTaskRow, SkippedItemRow},
    Plan,
};

pub const RENAME_TASKS_CSV: &str = "rename_tasks.csv";
pub const SKIPPED_ITEMS_CSV: &str = "skipped_items.csv";

pub fn write_rename_tasks<W: Write>(plan: &Plan, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(RenameTaskRow::HEADER)?;
    for task in &plan.rename_tasks {
        writer.write_record(RenameTaskRow::from(task).cells())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_skipped_items<W: Write>(plan: &Plan, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(SkippedItemRow::HEADER)?;
    for item in &plan.skipped_items {
        writer.write_record(SkippedItemRow::from(item).cells())?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes both CSV files into `dir` and returns their paths.
pub fn save(plan: &Plan, dir: &Path) -> Result<[PathBuf; 2]> {
    let rename_tasks = dir.join(RENAME_TASKS_CSV);
    let file = File::create(&rename_tasks)
        .with_context(|| format!("creating {}", rename_tasks.display()))?;
    write_rename_tasks(plan, file)?;

    let skipped_items = dir.join(SKIPPED_ITEMS_CSV);
    let file = File::create(&skipped_items)
        .with_context(|| format!("creating {}", skipped_items.display()))?;
    write_skipped_items(plan, file)?;

    Ok([rename_tasks, skipped_items])
}
