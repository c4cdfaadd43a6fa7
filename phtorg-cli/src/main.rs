use std::{
    io,
    path::PathBuf,
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::Result;
use chrono_tz::Tz;
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use phtorg_lib::{config::DEFAULT_TIMEZONE, CancelFlag, Organizer, OrganizerConfig, Plan};
use slog::{info, Logger};
use sloggers::{
    terminal::{Destination, TerminalLoggerBuilder},
    types::Severity,
    Build,
};

use prompt::Response;

mod preview;
mod prompt;
mod save;

/// Exit status of a process ended by SIGINT.
const INTERRUPTED: i32 = 130;

/// Renames photos and videos into a year-bucketed tree named by time taken
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory (or single file) to organize
    src_dir: PathBuf,
    /// Root of the organized tree
    dst_dir: PathBuf,
    /// Timezone file names are expressed in
    #[arg(long, default_value_t = DEFAULT_TIMEZONE)]
    timezone: Tz,
    /// Number of metadata extraction workers [default: number of CPUs]
    #[arg(long)]
    workers: Option<usize>,
    /// Where `save` writes the CSV files
    #[arg(long, default_value = ".")]
    csv_dir: PathBuf,
    /// Rename without asking
    #[arg(short, long)]
    yes: bool,
    /// Log more; repeat for trace output
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn build_logger(verbose: u8) -> Result<Logger> {
    let level = match verbose {
        0 => Severity::Info,
        1 => Severity::Debug,
        _ => Severity::Trace,
    };
    let mut builder = TerminalLoggerBuilder::new();
    builder.level(level).destination(Destination::Stderr);
    Ok(builder.build()?)
}

fn progress_bar(message: &'static str) -> Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    )?);
    bar.set_message(message);
    Ok(bar)
}

/// The first interrupt while planning cancels it; any other one exits.
fn handle_interrupts(cancel: CancelFlag, planning: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        if planning.load(Ordering::SeqCst) && !cancel.is_cancelled() {
            cancel.cancel();
        } else {
            process::exit(INTERRUPTED);
        }
    })?;
    Ok(())
}

fn commit(organizer: &Organizer, plan: &Plan, logger: &Logger) -> Result<()> {
    let bar = progress_bar("Renaming")?;
    bar.set_length(plan.rename_tasks.len() as u64);
    let renamed = organizer.commit(plan, |p| bar.set_position(p.completed as u64));
    bar.finish_and_clear();
    let renamed = renamed?;
    info!(logger, "done"; "renamed" => renamed);
    println!("Renamed {renamed} files.");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let logger = build_logger(args.verbose)?;

    let mut config = OrganizerConfig::new(&args.dst_dir).with_timezone(args.timezone);
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    let organizer = Organizer::new(config).with_logger(logger.clone());

    let cancel = CancelFlag::default();
    let planning = Arc::new(AtomicBool::new(true));
    handle_interrupts(cancel.clone(), Arc::clone(&planning))?;

    let bar = progress_bar("Reading metadata")?;
    let plan = organizer.plan(&args.src_dir, &cancel, |p| {
        bar.set_length(p.total as u64);
        bar.set_position(p.completed as u64);
    });
    bar.finish_and_clear();
    planning.store(false, Ordering::SeqCst);
    let plan = plan?;

    if plan.cancelled {
        println!(
            "Interrupted after {} of {} files.",
            plan.completed, plan.total
        );
    }
    println!("Collected {} rename tasks.", plan.rename_tasks.len());
    println!("Collected {} skipped items.", plan.skipped_items.len());
    if plan.rename_tasks.is_empty() && plan.skipped_items.is_empty() {
        return Ok(());
    }

    if args.yes {
        return commit(&organizer, &plan, &logger);
    }
    println!("Rename the files, preview the tasks, save the tasks in CSV, or abort?");
    let mut input = io::stdin().lock();
    let mut output = io::stdout();
    loop {
        match prompt::ask(&mut input, &mut output)? {
            Response::Rename => return commit(&organizer, &plan, &logger),
            Response::Preview => {
                print!("{}", preview::render(&plan));
                println!("{}", serde_json::to_string_pretty(&plan.stats())?);
            }
            Response::Save => {
                let [rename_tasks, skipped_items] = save::save(&plan, &args.csv_dir)?;
                info!(logger, "saved plan";
                    "rename_tasks" => rename_tasks.display(),
                    "skipped_items" => skipped_items.display(),
                );
            }
            Response::Abort => return Ok(()),
        }
    }
}
