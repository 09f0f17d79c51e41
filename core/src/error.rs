//! Error types for the Todoist command client.
//!
//! # Design
//! Errors are layered by where they happen. `ValidationError` is raised
//! locally before anything is sent. `TransportError` means no usable response
//! arrived, so nothing can be said about the server-side effect.
//! `BatchCommandError` means the server answered and at least one command was
//! rejected; it carries the full `ExecutionReport` so temp ids resolved by the
//! successful commands of the same batch stay reachable.

use thiserror::Error;
use uuid::Uuid;

use crate::command::TempId;
use crate::executor::ExecutionReport;

/// Top-level error returned by the client, executor and services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The batch or one of its commands was rejected before sending.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server processed the batch but rejected one or more commands.
    #[error(transparent)]
    Batch(#[from] BatchCommandError),

    /// A temp id was looked up before (or without) being resolved.
    #[error(transparent)]
    UnresolvedReference(#[from] UnresolvedReferenceError),

    /// The server returned a non-200 status for the sync request.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Local validation failures. Never involves the network.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cannot submit an empty command batch")]
    EmptyBatch,

    #[error("temp id `{0}` is already used in this batch")]
    DuplicateTempId(TempId),

    #[error("command uuid {0} is already used in this batch")]
    DuplicateUuid(Uuid),

    /// Command arguments must serialize to a JSON object.
    #[error("arguments of `{command_type}` must be a JSON object")]
    InvalidArgs { command_type: String },

    /// A list-style command was given nothing to act on.
    #[error("`{0}` needs at least one entry")]
    EmptyArgument(&'static str),
}

/// Transport-level failures reported by a `Transport` implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    /// The caller cancelled the request before a response was parsed. The
    /// server-side effect of the batch is unknown.
    #[error("request cancelled")]
    Cancelled,
}

/// Raised when a temp id has no real id (yet).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("temp id `{temp_id}` is not resolved")]
pub struct UnresolvedReferenceError {
    pub temp_id: TempId,
}

/// One rejected command from a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub uuid: Uuid,
    pub command_type: String,
    pub temp_id: Option<TempId>,
    pub code: i64,
    pub message: String,
}

/// Aggregate of every rejected command of one batch.
///
/// Commands that were applied are not rolled back by the server; the wrapped
/// report still resolves their temp ids.
#[derive(Debug, Error)]
#[error("{}", describe(.report))]
pub struct BatchCommandError {
    report: ExecutionReport,
}

impl BatchCommandError {
    pub(crate) fn new(report: ExecutionReport) -> Self {
        Self { report }
    }

    pub fn failures(&self) -> &[CommandFailure] {
        self.report.failures()
    }

    /// The report of the failed batch, including resolutions of the commands
    /// that were applied.
    pub fn report(&self) -> &ExecutionReport {
        &self.report
    }

    pub fn into_report(self) -> ExecutionReport {
        self.report
    }
}

fn describe(report: &ExecutionReport) -> String {
    format!(
        "{} of {} commands failed: {}",
        report.failures().len(),
        report.outcomes().len(),
        summary(report.failures())
    )
}

fn summary(failures: &[CommandFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({}): {}", f.command_type, f.code, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_messages() {
        assert_eq!(
            ValidationError::EmptyBatch.to_string(),
            "cannot submit an empty command batch"
        );
        assert_eq!(
            ValidationError::DuplicateTempId(TempId::new("t1")).to_string(),
            "temp id `t1` is already used in this batch"
        );
    }

    #[test]
    fn transport_error_converts_into_api_error() {
        let err: ApiError = TransportError::Cancelled.into();
        assert!(matches!(err, ApiError::Transport(TransportError::Cancelled)));
        assert_eq!(err.to_string(), "request cancelled");
    }

    #[test]
    fn summary_lists_every_failure() {
        let failures = vec![
            CommandFailure {
                uuid: Uuid::nil(),
                command_type: "item_add".to_string(),
                temp_id: None,
                code: 15,
                message: "invalid".to_string(),
            },
            CommandFailure {
                uuid: Uuid::nil(),
                command_type: "item_delete".to_string(),
                temp_id: None,
                code: 22,
                message: "Item not found".to_string(),
            },
        ];
        assert_eq!(
            summary(&failures),
            "item_add (15): invalid; item_delete (22): Item not found"
        );
    }
}
