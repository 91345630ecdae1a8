//! Naive notification-style strategy.
//!
//! Each step is issued from inside the previous step's completion, exactly
//! as a caller would use the raw store without the bridge. No classification
//! happens here: failures are observed only through the completion's error
//! argument, and every store completion carries a `StoreError` by
//! construction.

use super::{lock_report, WorkflowReport, WorkflowState};
use crate::command::CommandSet;
use crate::store::RawStore;
use log::warn;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

/// Runs the workflow with nested completion closures, blocking until the
/// final cleanup completion fires.
pub fn run_callback(store: &RawStore, commands: &CommandSet) -> WorkflowReport {
    let report = Arc::new(Mutex::new(WorkflowReport::new()));
    let (done_tx, done_rx) = mpsc::channel::<()>();

    let handle = store.handle();
    let insert = commands.insert.clone();
    let read = commands.read.clone();
    let drop_command = commands.drop.clone();

    let report_define = Arc::clone(&report);
    store.execute(&commands.define, move |result| {
        if let Err(err) = result {
            // Nothing was created, so there is nothing to clean up.
            lock_report(&report_define).record_store_error(err);
            let _ = done_tx.send(());
            return;
        }
        lock_report(&report_define).transition(WorkflowState::TableCreated);

        let report_insert = Arc::clone(&report_define);
        let handle_read = handle.clone();
        handle.execute(&insert, move |result| {
            {
                let mut report = lock_report(&report_insert);
                match result {
                    Ok(outcome) => {
                        report.inserted_id = Some(outcome.last_insert_id);
                        report.transition(WorkflowState::RecordInserted);
                    }
                    Err(err) => {
                        report.record_store_error(err);
                        report.transition(WorkflowState::InsertFailed);
                    }
                }
            }

            let report_read = Arc::clone(&report_insert);
            let handle_drop = handle_read.clone();
            handle_read.query_all(&read, move |result| {
                {
                    let mut report = lock_report(&report_read);
                    match result {
                        Ok(records) => {
                            report.records = Some(records);
                            report.transition(WorkflowState::RecordRead);
                        }
                        Err(err) => {
                            report.record_store_error(err);
                            report.transition(WorkflowState::ReadFailed);
                        }
                    }
                }

                // Cleanup is issued from the innermost continuation so it
                // runs on the success and failure branches alike.
                let report_drop = Arc::clone(&report_read);
                handle_drop.execute(&drop_command, move |result| {
                    {
                        let mut report = lock_report(&report_drop);
                        match result {
                            Ok(_) => report.transition(WorkflowState::TableDropped),
                            Err(err) => report.record_store_error(err),
                        }
                    }
                    let _ = done_tx.send(());
                });
            });
        });
    });

    if done_rx.recv().is_err() {
        warn!("event=workflow_callback module=workflow status=error error_code=completion_lost");
    }
    let final_report = lock_report(&report).clone();
    final_report
}
