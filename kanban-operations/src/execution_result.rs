//! Execution result types for operations

use crate::LogEntry;

/// Outcome of executing an operation.
///
/// Mutations that settled (successfully or by rolling back) carry a
/// `LogEntry`; reads and validation no-ops do not.
#[derive(Debug)]
pub enum ExecutionResult<T, E> {
    /// Mutation settled successfully; record it
    Logged { value: T, log_entry: LogEntry },
    /// Read-only or no-op; nothing to record
    Unlogged { value: T },
    /// Operation failed, optionally with an entry describing the rollback
    Failed {
        error: E,
        log_entry: Option<LogEntry>,
    },
}

impl<T, E> ExecutionResult<T, E> {
    /// Extract the result (Ok or Err)
    pub fn into_result(self) -> Result<T, E> {
        self.split().0
    }

    /// Get the value and log entry separately
    pub fn split(self) -> (Result<T, E>, Option<LogEntry>) {
        match self {
            Self::Logged { value, log_entry } => (Ok(value), Some(log_entry)),
            Self::Unlogged { value } => (Ok(value), None),
            Self::Failed { error, log_entry } => (Err(error), log_entry),
        }
    }

    /// Borrow the log entry, if any
    pub fn log_entry(&self) -> Option<&LogEntry> {
        match self {
            Self::Logged { log_entry, .. } => Some(log_entry),
            Self::Failed { log_entry, .. } => log_entry.as_ref(),
            Self::Unlogged { .. } => None,
        }
    }

    /// True for the `Failed` variant
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Check if this should be logged
    pub fn should_log(&self) -> bool {
        self.log_entry().is_some()
    }

    /// Transform the success value, keeping the log entry
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExecutionResult<U, E> {
        match self {
            Self::Logged { value, log_entry } => ExecutionResult::Logged {
                value: f(value),
                log_entry,
            },
            Self::Unlogged { value } => ExecutionResult::Unlogged { value: f(value) },
            Self::Failed { error, log_entry } => ExecutionResult::Failed { error, log_entry },
        }
    }
}
