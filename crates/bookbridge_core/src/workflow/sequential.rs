//! Sequential-await strategy.
//!
//! Steps are awaited in program order. Store failures are classified and
//! reported locally, unexpected failures propagate, and cleanup is attempted
//! on every exit path.

use super::{WorkflowReport, WorkflowState};
use crate::bridge::AsyncStore;
use crate::command::CommandSet;
use crate::error::{classify_failure, BridgeError};

/// Runs the workflow by awaiting each step in program order.
pub async fn run_sequential(
    store: &AsyncStore,
    commands: &CommandSet,
) -> Result<WorkflowReport, BridgeError> {
    let mut report = WorkflowReport::new();

    store.execute(&commands.define).await?;
    report.transition(WorkflowState::TableCreated);

    // Cleanup must run even when a middle step fails unexpectedly, so the
    // fallible section is sequenced before the unconditional drop.
    let outcome = insert_and_read(store, commands, &mut report).await;
    let cleanup = store.execute(&commands.drop).await;

    outcome?;
    cleanup?;
    report.transition(WorkflowState::TableDropped);
    Ok(report)
}

async fn insert_and_read(
    store: &AsyncStore,
    commands: &CommandSet,
    report: &mut WorkflowReport,
) -> Result<(), BridgeError> {
    match store.execute(&commands.insert).await {
        Ok(outcome) => {
            report.inserted_id = Some(outcome.last_insert_id);
            report.transition(WorkflowState::RecordInserted);
        }
        Err(err) => {
            let store_err = classify_failure(err)?;
            report.record_store_error(store_err);
            report.transition(WorkflowState::InsertFailed);
        }
    }

    match store.query_all(&commands.read).await {
        Ok(records) => {
            report.records = Some(records);
            report.transition(WorkflowState::RecordRead);
        }
        Err(err) => {
            let store_err = classify_failure(err)?;
            report.record_store_error(store_err);
            report.transition(WorkflowState::ReadFailed);
        }
    }

    Ok(())
}
