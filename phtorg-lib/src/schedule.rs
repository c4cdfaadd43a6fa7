//! Fans per-file work out over a bounded worker pool and streams the results
//! back to a single coordinating thread.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    time::Duration,
};

use rayon::{ThreadPool, ThreadPoolBuilder};
use slog::{o, warn, Discard, Logger};

use crate::{discover::Candidate, record::RenameTask, Error};

/// How long the coordinator waits for a completion before looking at the
/// cancellation flag again.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Cooperative cancellation shared between the coordinator, the workers and
/// whoever handles the interrupt.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The outcome of one candidate's work.
#[derive(Debug)]
pub struct Completion {
    pub candidate: Candidate,
    pub outcome: Result<RenameTask, Error>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub total: usize,
    pub cancelled: bool,
}

pub struct Scheduler {
    pool: ThreadPool,
    poll_interval: Duration,
    logger: Logger,
}

impl Scheduler {
    pub fn new(workers: usize) -> Result<Self, Error> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("phtorg-worker-{i}"))
            .build()?;
        Ok(Self {
            pool,
            poll_interval: POLL_INTERVAL,
            logger: Logger::root(Discard, o!()),
        })
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Submits every candidate up front, then hands each completion to
    /// `on_complete` in whatever order they finish.
    ///
    /// Once `cancel` is set the coordinator takes the completions already
    /// queued and returns; workers skip candidates they have not started yet
    /// and anything still running is abandoned.
    pub fn run<W, F>(
        &self,
        candidates: Vec<Candidate>,
        work: W,
        cancel: &CancelFlag,
        mut on_complete: F,
    ) -> RunSummary
    where
        W: Fn(&Candidate) -> Result<RenameTask, Error> + Send + Sync + 'static,
        F: FnMut(Completion, Progress),
    {
        let total = candidates.len();
        let work = Arc::new(work);
        let (tx, rx) = mpsc::channel();
        for candidate in candidates {
            let tx = tx.clone();
            let work = Arc::clone(&work);
            let cancel = cancel.clone();
            self.pool.spawn(move || {
                if cancel.is_cancelled() {
                    return;
                }
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&candidate)))
                    .unwrap_or_else(|payload| Err(Error::WorkerPanicked(panic_message(&*payload))));
                // The coordinator is gone after a cancellation.
                let _ = tx.send(Completion { candidate, outcome });
            });
        }
        drop(tx);

        let mut completed = 0;
        while completed < total {
            if cancel.is_cancelled() {
                // Completions already queued are kept.
                for completion in rx.try_iter() {
                    completed += 1;
                    on_complete(completion, Progress { completed, total });
                }
                if completed < total {
                    warn!(self.logger, "cancelled, abandoning remaining work";
                        "completed" => completed,
                        "total" => total,
                    );
                }
                break;
            }
            match rx.recv_timeout(self.poll_interval) {
                Ok(completion) => {
                    completed += 1;
                    on_complete(completion, Progress { completed, total });
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        RunSummary {
            completed,
            total,
            cancelled: completed < total,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
