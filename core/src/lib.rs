//! Batched-command client core for the Todoist Sync API.
//!
//! # Overview
//! Commands are queued into a `CommandBatch`, sent as one request through a
//! caller-supplied `Transport`, and the per-command results are correlated
//! back by uuid. Creating commands carry a `TempId` that resolves to the
//! server-assigned id once the command is applied.
//!
//! # Design
//! - `TodoistClient` builds the `HttpRequest` and parses the `HttpResponse`
//!   without doing any I/O; `Transport` does the round-trip.
//! - `CommandExecutor` runs one batch at a time per call and produces an
//!   `ExecutionReport`. Partial failure surfaces as
//!   `ApiError::Batch(BatchCommandError)`, which still holds the report so the
//!   temp ids of applied commands can be resolved.
//! - `items` and `projects` provide typed command constructors and
//!   single-command services on top of the executor.

pub mod batch;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod items;
pub mod projects;
pub mod resolver;
pub mod types;

pub use batch::{BatchPayload, CommandBatch};
pub use client::TodoistClient;
pub use command::{Command, CommandState, ComplexId, TempId};
pub use config::ClientConfig;
pub use error::{
    ApiError, BatchCommandError, CommandFailure, TransportError, UnresolvedReferenceError,
    ValidationError,
};
pub use executor::{CancelToken, CommandExecutor, CommandOutcome, ExecutionReport};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use resolver::TempIdResolver;
pub use types::{CommandError, CommandStatus, SyncResponse};

#[cfg(feature = "reqwest")]
pub use http::ReqwestTransport;
