//! Bulk reconciliation of user records against a user pool.
//!
//! Records are read and decoded on a blocking thread and handed to the
//! engine over a bounded channel, then filtered sequentially in input order.
//! Every live
//! record is then dispatched as its own task; there is no worker cap and
//! completion order is unconstrained.
//!
//! Two failure policies are supported:
//!
//! - [`FailurePolicy::FailFast`]: the first failed task raises a shared
//!   cancellation flag. Records read after the flag is observed are not
//!   dispatched; tasks already in flight run to completion.
//! - [`FailurePolicy::FailSoft`]: every record is dispatched.
//!
//! Both policies wait for every dispatched task before reporting. The
//! reported error is the one with the lowest input line number, so repeated
//! runs over the same input report the same failure.

use crate::error::{Result, UserPoolError};
use crate::records::decoder::{DecodedRecord, RecordDecoder};
use crate::records::filter::UsernameFilter;
use crate::userpool::options::{ApplyOption, ApplyOptions};
use crate::userpool::{UserPool, UserPoolApi};
use crate::utils::format::format_number;
use crate::utils::progress::ProgressBar;
use serde::Serialize;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// What a per-record failure does to the rest of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    #[default]
    FailFast,
    FailSoft,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileSettings {
    /// Decode, filter and count without calling the directory
    pub dry_run: bool,
    pub policy: FailurePolicy,
    /// Draw a spinner on stderr
    pub show_progress: bool,
}

/// Counters shared with every dispatched task.
#[derive(Debug, Default)]
pub struct RunCounters {
    applied: AtomicU64,
    skipped: AtomicU64,
}

impl RunCounters {
    fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
    }

    fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// Final counts of a run, printed as the command's JSON result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub applied: u64,
    pub skipped: u64,
    pub failed: u64,
    pub not_dispatched: u64,
    pub dry_run: bool,
}

/// Summary plus the error to report, if any.
///
/// The summary is always complete, even when the run failed.
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    pub error: Option<UserPoolError>,
}

impl RunReport {
    pub fn into_result(self) -> Result<RunSummary> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.summary),
        }
    }
}

type TaskOutcome = std::result::Result<(), (usize, UserPoolError)>;

/// Decoded records buffered ahead of dispatch
const READ_AHEAD: usize = 256;

/// Keep whichever failure comes from the earliest input line.
fn keep_earliest(first: &mut Option<(usize, UserPoolError)>, line: usize, err: UserPoolError) {
    if first.as_ref().is_none_or(|(current, _)| line < *current) {
        *first = Some((line, err));
    }
}

/// Drives one apply-users run against a resolved pool.
pub struct Reconciler<A> {
    pool: Arc<UserPool<A>>,
    modifiers: Arc<[ApplyOption]>,
    decoder: RecordDecoder,
    filter: UsernameFilter,
    settings: ReconcileSettings,
}

impl<A: UserPoolApi + 'static> Reconciler<A> {
    /// Conflicting modifiers fail here, before any record is read.
    pub fn new(
        pool: Arc<UserPool<A>>,
        modifiers: Vec<ApplyOption>,
        decoder: RecordDecoder,
        filter: UsernameFilter,
        settings: ReconcileSettings,
    ) -> Result<Self> {
        ApplyOptions::resolve(&modifiers)?;
        Ok(Self {
            pool,
            modifiers: modifiers.into(),
            decoder,
            filter,
            settings,
        })
    }

    pub async fn run<R: BufRead + Send + 'static>(&self, reader: R) -> RunReport {
        let counters = Arc::new(RunCounters::default());
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
        let mut first_error: Option<(usize, UserPoolError)> = None;
        let mut failed = 0u64;
        let mut not_dispatched = 0u64;

        let progress = if self.settings.show_progress {
            ProgressBar::new_spinner("Applying users")
        } else {
            ProgressBar::hidden()
        };

        info!(
            pool_id = %self.pool.id(),
            dry_run = self.settings.dry_run,
            policy = ?self.settings.policy,
            "starting reconciliation"
        );

        let (tx, mut rx) = mpsc::channel::<Result<DecodedRecord>>(READ_AHEAD);
        let decoder = self.decoder.clone();
        let read_task = tokio::task::spawn_blocking(move || {
            for item in decoder.records(reader) {
                let malformed = item.is_err();
                if tx.blocking_send(item).is_err() || malformed {
                    break;
                }
            }
        });

        while let Some(item) = rx.recv().await {
            let DecodedRecord { line, record } = match item {
                Ok(decoded) => decoded,
                Err(err) => {
                    warn!(error = %err, "stopping at malformed input");
                    keep_earliest(&mut first_error, error_line(&err), err);
                    break;
                }
            };

            if !self.filter.matches(&record.username) {
                debug!(line, username = %record.username, "skip user");
                counters.record_skipped();
                continue;
            }

            if self.settings.dry_run {
                debug!(line, username = %record.username, "dry run: would apply user");
                counters.record_applied();
                progress.inc();
                continue;
            }

            if self.settings.policy == FailurePolicy::FailFast && cancelled.load(Ordering::SeqCst) {
                debug!(line, username = %record.username, "cancelled: not dispatching user");
                not_dispatched += 1;
                continue;
            }

            debug!(line, username = %record.username, "applying user");
            let pool = Arc::clone(&self.pool);
            let modifiers = Arc::clone(&self.modifiers);
            let counters = Arc::clone(&counters);
            let cancelled = Arc::clone(&cancelled);
            let progress = progress.clone();
            let policy = self.settings.policy;

            tasks.spawn(async move {
                let username = record.username.clone();
                match pool.apply_user(record, &modifiers).await {
                    Ok(()) => {
                        counters.record_applied();
                        progress.inc();
                        Ok(())
                    }
                    Err(err) => {
                        warn!(line, username = %username, error = %err, "failed to apply user");
                        if policy == FailurePolicy::FailFast {
                            cancelled.store(true, Ordering::SeqCst);
                        }
                        Err((line, err))
                    }
                }
            });
            // Let the new task start before reading on, so a failure can
            // raise the flag ahead of the next dispatch decision.
            tokio::task::yield_now().await;
        }

        // Unblocks the reader if it is waiting on a full channel
        drop(rx);
        if let Err(join_err) = read_task.await {
            keep_earliest(
                &mut first_error,
                usize::MAX,
                UserPoolError::Task(join_err.to_string()),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err((line, err))) => {
                    failed += 1;
                    keep_earliest(&mut first_error, line, UserPoolError::at_line(line, err));
                }
                Err(join_err) => {
                    failed += 1;
                    keep_earliest(
                        &mut first_error,
                        usize::MAX,
                        UserPoolError::Task(join_err.to_string()),
                    );
                }
            }
        }

        let summary = RunSummary {
            applied: counters.applied(),
            skipped: counters.skipped(),
            failed,
            not_dispatched,
            dry_run: self.settings.dry_run,
        };

        progress.finish_with_message(&format!(
            "{} users applied",
            format_number(summary.applied as usize)
        ));
        info!(
            applied = summary.applied,
            skipped = summary.skipped,
            failed = summary.failed,
            not_dispatched = summary.not_dispatched,
            dry_run = summary.dry_run,
            "reconciliation finished"
        );

        RunReport {
            summary,
            error: first_error.map(|(_, err)| err),
        }
    }
}

fn error_line(err: &UserPoolError) -> usize {
    match err {
        UserPoolError::Decode { line, .. } | UserPoolError::Record { line, .. } => *line,
        _ => usize::MAX,
    }
}
