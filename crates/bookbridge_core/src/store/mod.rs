//! Callback-driven record store handle.
//!
//! # Responsibility
//! - Own the SQLite connection on a dedicated worker thread.
//! - Expose the three store primitives with exactly-once completion
//!   notification.
//!
//! # Invariants
//! - Completions run on the worker thread, never in the caller's frame.
//! - Every job the worker accepts invokes its completion exactly once; a job
//!   submitted after shutdown drops its completion instead.
//! - Dropping `RawStore` drains already-queued jobs, then joins the worker.

mod worker;

use crate::command::{Command, Record};
use crate::error::{StoreError, StoreErrorCategory};
use log::{error, info, warn};
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use std::time::Instant;

/// Mutation outcome: last inserted row id plus affected row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub last_insert_id: i64,
    pub rows_affected: usize,
}

pub(crate) type ExecCompletion = Box<dyn FnOnce(Result<ExecOutcome, StoreError>) + Send>;
pub(crate) type QueryOneCompletion = Box<dyn FnOnce(Result<Option<Record>, StoreError>) + Send>;
pub(crate) type QueryAllCompletion = Box<dyn FnOnce(Result<Vec<Record>, StoreError>) + Send>;

pub(crate) enum Job {
    Execute {
        command: Command,
        done: ExecCompletion,
    },
    QueryOne {
        command: Command,
        done: QueryOneCompletion,
    },
    QueryAll {
        command: Command,
        done: QueryAllCompletion,
    },
    Shutdown,
}

/// Cloneable job-submission handle for the store worker.
///
/// Completions are `FnOnce`, so a second invocation is unrepresentable. A
/// completion that is never invoked (worker already shut down) is dropped,
/// which bridged callers observe as an unexpected error rather than a hang.
#[derive(Clone)]
pub struct StoreHandle {
    jobs: Sender<Job>,
}

impl StoreHandle {
    /// Runs a mutating command. `done` fires exactly once on the worker.
    pub fn execute(
        &self,
        command: &Command,
        done: impl FnOnce(Result<ExecOutcome, StoreError>) + Send + 'static,
    ) {
        self.submit(Job::Execute {
            command: command.clone(),
            done: Box::new(done),
        });
    }

    /// Runs a query bounded to its first matching record.
    pub fn query_one(
        &self,
        command: &Command,
        done: impl FnOnce(Result<Option<Record>, StoreError>) + Send + 'static,
    ) {
        self.submit(Job::QueryOne {
            command: command.clone(),
            done: Box::new(done),
        });
    }

    /// Runs a query returning every matching record.
    pub fn query_all(
        &self,
        command: &Command,
        done: impl FnOnce(Result<Vec<Record>, StoreError>) + Send + 'static,
    ) {
        self.submit(Job::QueryAll {
            command: command.clone(),
            done: Box::new(done),
        });
    }

    fn submit(&self, job: Job) {
        if self.jobs.send(job).is_err() {
            warn!("event=store_submit module=store status=error error_code=worker_unavailable");
        }
    }
}

/// A live record store: worker thread plus submission handle.
pub struct RawStore {
    handle: StoreHandle,
    worker: Option<JoinHandle<()>>,
}

impl RawStore {
    /// Opens a file-backed store and waits for the connection to be ready.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::spawn(worker::Target::File(path.as_ref().to_path_buf()), "file")
    }

    /// Opens an in-memory store and waits for the connection to be ready.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::spawn(worker::Target::Memory, "memory")
    }

    fn spawn(target: worker::Target, mode: &'static str) -> Result<Self, StoreError> {
        let started_at = Instant::now();
        let (jobs_tx, jobs_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = std::thread::spawn(move || worker::run(target, jobs_rx, ready_tx));

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!(
                    "event=store_open module=store status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    handle: StoreHandle { jobs: jobs_tx },
                    worker: Some(worker),
                })
            }
            Ok(Err(err)) => {
                error!(
                    "event=store_open module=store status=error mode={mode} duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                let _ = worker.join();
                Err(err)
            }
            Err(_) => {
                error!(
                    "event=store_open module=store status=error mode={mode} error_code=worker_exited"
                );
                let _ = worker.join();
                Err(StoreError {
                    category: StoreErrorCategory::Io,
                    message: "store worker exited before the connection was ready".to_string(),
                })
            }
        }
    }

    /// Returns a cloneable handle for submitting jobs, e.g. from inside a
    /// prior job's completion.
    pub fn handle(&self) -> StoreHandle {
        self.handle.clone()
    }

    /// See [`StoreHandle::execute`].
    pub fn execute(
        &self,
        command: &Command,
        done: impl FnOnce(Result<ExecOutcome, StoreError>) + Send + 'static,
    ) {
        self.handle.execute(command, done);
    }

    /// See [`StoreHandle::query_one`].
    pub fn query_one(
        &self,
        command: &Command,
        done: impl FnOnce(Result<Option<Record>, StoreError>) + Send + 'static,
    ) {
        self.handle.query_one(command, done);
    }

    /// See [`StoreHandle::query_all`].
    pub fn query_all(
        &self,
        command: &Command,
        done: impl FnOnce(Result<Vec<Record>, StoreError>) + Send + 'static,
    ) {
        self.handle.query_all(command, done);
    }
}

impl Drop for RawStore {
    fn drop(&mut self) {
        // Jobs queued before the shutdown marker still run to completion.
        let _ = self.handle.jobs.send(Job::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("event=store_close module=store status=error error_code=worker_panicked");
            } else {
                info!("event=store_close module=store status=ok");
            }
        }
    }
}
