//! The four-step demonstration workflow in three invocation styles.
//!
//! # Responsibility
//! - Define the observable report shared by all strategies.
//! - Run the three strategies one after another, each fully settled
//!   (cleanup included) before the next begins.
//!
//! # Invariants
//! - The cleanup step is attempted on every exit path of every strategy.
//! - Strategies never run concurrently and never share a store.

mod callback;
mod chained;
mod sequential;

pub use callback::run_callback;
pub use chained::run_chained;
pub use sequential::run_sequential;

use crate::bridge::AsyncStore;
use crate::command::{CommandSet, Record};
use crate::error::{BridgeError, StoreError};
use crate::store::RawStore;
use log::{info, warn};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Pause between demonstration strategies, keeping interleavings readable.
const PACING_DELAY: Duration = Duration::from_millis(100);

/// Workflow progress states, recorded in transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Created,
    TableCreated,
    RecordInserted,
    RecordRead,
    InsertFailed,
    ReadFailed,
    TableDropped,
}

/// Observable outcome of one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowReport {
    /// Identifier of the inserted record, when the insert step succeeded.
    pub inserted_id: Option<i64>,
    /// Records returned by the read step, when it succeeded.
    pub records: Option<Vec<Record>>,
    /// Store errors reported during the run, in occurrence order.
    pub store_errors: Vec<StoreError>,
    /// State trace from `Created` to the terminal state.
    pub states: Vec<WorkflowState>,
}

impl WorkflowReport {
    pub(crate) fn new() -> Self {
        Self {
            inserted_id: None,
            records: None,
            store_errors: Vec::new(),
            states: vec![WorkflowState::Created],
        }
    }

    pub(crate) fn transition(&mut self, state: WorkflowState) {
        self.states.push(state);
    }

    pub(crate) fn record_store_error(&mut self, error: StoreError) {
        warn!(
            "event=workflow_step module=workflow status=error category={} error={}",
            error.category.as_str(),
            error.message
        );
        self.store_errors.push(error);
    }

    /// Whether the terminal cleanup state was reached.
    pub fn cleanup_done(&self) -> bool {
        self.states.last() == Some(&WorkflowState::TableDropped)
    }
}

pub(crate) fn lock_report(report: &Mutex<WorkflowReport>) -> MutexGuard<'_, WorkflowReport> {
    report.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Which invocation style produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Callback,
    Chained,
    Sequential,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Callback => "callback",
            Self::Chained => "chained",
            Self::Sequential => "sequential",
        }
    }
}

/// Both runs of one strategy: the well-formed set, then the malformed set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemonstrationOutcome {
    pub strategy: Strategy,
    pub well_formed: WorkflowReport,
    pub malformed: WorkflowReport,
}

/// Runs all three strategies in order, each against a fresh in-memory store.
///
/// # Contract
/// - Each strategy fully settles (cleanup included) before the next begins.
/// - A fixed pacing delay separates the strategies.
/// - The blocking callback strategy runs on the blocking thread pool.
pub async fn run_demonstrations() -> Result<Vec<DemonstrationOutcome>, BridgeError> {
    let mut outcomes = Vec::with_capacity(3);

    info!("event=demonstration module=workflow status=start strategy=callback");
    let raw = RawStore::open_in_memory().map_err(BridgeError::Store)?;
    let callback_outcome = tokio::task::spawn_blocking(move || {
        let well_formed = run_callback(&raw, &CommandSet::well_formed());
        let malformed = run_callback(&raw, &CommandSet::malformed());
        DemonstrationOutcome {
            strategy: Strategy::Callback,
            well_formed,
            malformed,
        }
    })
    .await
    .map_err(|err| BridgeError::Unexpected(format!("callback demonstration panicked: {err}")))?;
    outcomes.push(callback_outcome);
    tokio::time::sleep(PACING_DELAY).await;

    info!("event=demonstration module=workflow status=start strategy=chained");
    let store = AsyncStore::open_in_memory().map_err(BridgeError::Store)?;
    let well_formed = run_chained(&store, &CommandSet::well_formed()).await?;
    let malformed = run_chained(&store, &CommandSet::malformed()).await?;
    drop(store);
    outcomes.push(DemonstrationOutcome {
        strategy: Strategy::Chained,
        well_formed,
        malformed,
    });
    tokio::time::sleep(PACING_DELAY).await;

    info!("event=demonstration module=workflow status=start strategy=sequential");
    let store = AsyncStore::open_in_memory().map_err(BridgeError::Store)?;
    let well_formed = run_sequential(&store, &CommandSet::well_formed()).await?;
    let malformed = run_sequential(&store, &CommandSet::malformed()).await?;
    drop(store);
    outcomes.push(DemonstrationOutcome {
        strategy: Strategy::Sequential,
        well_formed,
        malformed,
    });

    info!("event=demonstration module=workflow status=ok strategies=3");
    Ok(outcomes)
}
