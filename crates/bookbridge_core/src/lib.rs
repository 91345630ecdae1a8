//! Callback-to-future bridging layer over a SQLite-backed record store.
//! This crate is the single source of truth for the bridge's error and
//! ordering semantics.

pub mod bridge;
pub mod command;
pub mod error;
pub mod logging;
pub mod store;
pub mod workflow;

pub use bridge::AsyncStore;
pub use command::{Command, CommandSet, Param, Record, Value, BOOK_TITLE};
pub use error::{classify_failure, BridgeError, StoreError, StoreErrorCategory};
pub use logging::{default_log_level, init_logging, logging_status};
pub use store::{ExecOutcome, RawStore, StoreHandle};
pub use workflow::{
    run_callback, run_chained, run_demonstrations, run_sequential, DemonstrationOutcome, Strategy,
    WorkflowReport, WorkflowState,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
