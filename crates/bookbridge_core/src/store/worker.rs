//! Store worker loop: owns the SQLite connection and drains the job queue.
//!
//! # Invariants
//! - The connection never leaves this thread.
//! - Each drained job invokes its completion exactly once before the next
//!   job is picked up.

use super::{ExecOutcome, Job};
use crate::command::{Command, Record, Value};
use crate::error::StoreError;
use log::debug;
use rusqlite::{params_from_iter, Connection, Row};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

pub(crate) enum Target {
    File(PathBuf),
    Memory,
}

pub(crate) fn run(target: Target, jobs: Receiver<Job>, ready: Sender<Result<(), StoreError>>) {
    let conn = match open_connection(target) {
        Ok(conn) => {
            if ready.send(Ok(())).is_err() {
                // Opener gave up before the handshake completed.
                return;
            }
            conn
        }
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    while let Ok(job) = jobs.recv() {
        match job {
            Job::Execute { command, done } => done(run_execute(&conn, &command)),
            Job::QueryOne { command, done } => done(run_query_one(&conn, &command)),
            Job::QueryAll { command, done } => done(run_query_all(&conn, &command)),
            Job::Shutdown => break,
        }
    }
}

fn open_connection(target: Target) -> Result<Connection, StoreError> {
    let conn = match target {
        Target::File(path) => Connection::open(path),
        Target::Memory => Connection::open_in_memory(),
    }
    .map_err(StoreError::from_sqlite)?;
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(StoreError::from_sqlite)?;
    Ok(conn)
}

fn run_execute(conn: &Connection, command: &Command) -> Result<ExecOutcome, StoreError> {
    let started_at = Instant::now();
    let result = conn
        .execute(command.sql, params_from_iter(command.params.iter()))
        .map(|rows_affected| ExecOutcome {
            last_insert_id: conn.last_insert_rowid(),
            rows_affected,
        })
        .map_err(StoreError::from_sqlite);
    log_completion("execute", &result.as_ref().map(|o| o.rows_affected), started_at);
    result
}

fn run_query_one(conn: &Connection, command: &Command) -> Result<Option<Record>, StoreError> {
    let started_at = Instant::now();
    let result = query_first(conn, command);
    log_completion(
        "query_one",
        &result.as_ref().map(|record| usize::from(record.is_some())),
        started_at,
    );
    result
}

fn run_query_all(conn: &Connection, command: &Command) -> Result<Vec<Record>, StoreError> {
    let started_at = Instant::now();
    let result = query_records(conn, command);
    log_completion(
        "query_all",
        &result.as_ref().map(|records| records.len()),
        started_at,
    );
    result
}

fn query_first(conn: &Connection, command: &Command) -> Result<Option<Record>, StoreError> {
    let mut stmt = conn.prepare(command.sql).map_err(StoreError::from_sqlite)?;
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let mut rows = stmt
        .query(params_from_iter(command.params.iter()))
        .map_err(StoreError::from_sqlite)?;

    match rows.next().map_err(StoreError::from_sqlite)? {
        Some(row) => Ok(Some(read_record(row, &columns)?)),
        None => Ok(None),
    }
}

fn query_records(conn: &Connection, command: &Command) -> Result<Vec<Record>, StoreError> {
    let mut stmt = conn.prepare(command.sql).map_err(StoreError::from_sqlite)?;
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let mut rows = stmt
        .query(params_from_iter(command.params.iter()))
        .map_err(StoreError::from_sqlite)?;

    let mut records = Vec::new();
    while let Some(row) = rows.next().map_err(StoreError::from_sqlite)? {
        records.push(read_record(row, &columns)?);
    }
    Ok(records)
}

fn read_record(row: &Row<'_>, columns: &[String]) -> Result<Record, StoreError> {
    let mut record = Record::new();
    for (index, name) in columns.iter().enumerate() {
        let value = row.get_ref(index).map_err(StoreError::from_sqlite)?;
        record.insert(name.clone(), Value::from_sqlite(value));
    }
    Ok(record)
}

fn log_completion(op: &str, result: &Result<usize, &StoreError>, started_at: Instant) {
    match result {
        Ok(rows) => debug!(
            "event=store_command module=store op={op} status=ok rows={rows} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => debug!(
            "event=store_command module=store op={op} status=error category={} duration_ms={}",
            err.category.as_str(),
            started_at.elapsed().as_millis()
        ),
    }
}
