//! Chained-combinator strategy.
//!
//! A failure short-circuits the chain to the nearest recovery stage, which
//! classifies it: store errors are reported and the chain resumes,
//! unexpected errors propagate. The final stage issues cleanup regardless of
//! how the chain above it ended.

use super::{lock_report, WorkflowReport, WorkflowState};
use crate::bridge::AsyncStore;
use crate::command::CommandSet;
use crate::error::{classify_failure, BridgeError};
use futures::{FutureExt, TryFutureExt};
use std::sync::Mutex;

/// Runs the workflow as one combinator chain over the bridge's futures.
pub async fn run_chained(
    store: &AsyncStore,
    commands: &CommandSet,
) -> Result<WorkflowReport, BridgeError> {
    let report = Mutex::new(WorkflowReport::new());

    // A define failure leaves nothing to recover or clean up, so it
    // propagates before the recovery stages are entered, matching the
    // sequential strategy.
    store.execute(&commands.define).await?;
    lock_report(&report).transition(WorkflowState::TableCreated);

    {
        // Every stage closure captures a copy of this shared reference.
        let report = &report;
        store
            .execute(&commands.insert)
            .map_ok(|outcome| {
                let mut report = lock_report(report);
                report.inserted_id = Some(outcome.last_insert_id);
                report.transition(WorkflowState::RecordInserted);
            })
            .or_else(|err| async move {
                let store_err = classify_failure(err)?;
                let mut report = lock_report(report);
                report.record_store_error(store_err);
                report.transition(WorkflowState::InsertFailed);
                Ok::<(), BridgeError>(())
            })
            .and_then(|_| store.query_all(&commands.read))
            .map_ok(|records| {
                let mut report = lock_report(report);
                report.records = Some(records);
                report.transition(WorkflowState::RecordRead);
            })
            .or_else(|err| async move {
                let store_err = classify_failure(err)?;
                let mut report = lock_report(report);
                report.record_store_error(store_err);
                report.transition(WorkflowState::ReadFailed);
                Ok::<(), BridgeError>(())
            })
            .then(|outcome| async move {
                // Cleanup runs no matter how the chain above ended.
                let cleanup = store.execute(&commands.drop).await;
                outcome?;
                cleanup?;
                lock_report(report).transition(WorkflowState::TableDropped);
                Ok::<(), BridgeError>(())
            })
            .await?;
    }

    Ok(report
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner()))
}
