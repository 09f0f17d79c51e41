//! Sends a batch and correlates the per-command results.
//!
//! # Design
//! One `execute` call means one request in flight and no retries. Every
//! execution owns its own `TempIdResolver`, so executors can run concurrently
//! on distinct batches without sharing mutable state.
//!
//! Results are walked in submission order. Applied commands resolve their
//! temp ids even if other commands of the same batch failed; the failures are
//! collected and reported together once every result has been processed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::batch::CommandBatch;
use crate::client::TodoistClient;
use crate::command::{Command, CommandState, ComplexId, TempId};
use crate::error::{ApiError, BatchCommandError, CommandFailure, TransportError, UnresolvedReferenceError};
use crate::http::Transport;
use crate::items::ItemsService;
use crate::projects::ProjectsService;
use crate::resolver::TempIdResolver;
use crate::types::SyncResponse;

/// Error code recorded when the server returned no status for a command.
pub const MISSING_STATUS_CODE: i64 = -1;

/// Error code recorded when a command's status could not be decoded.
pub const MALFORMED_STATUS_CODE: i64 = -2;

/// Final state of one submitted command. Outcomes only exist once the batch
/// has been sent; a queued command is `Enqueued` on the `CommandBatch` side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub uuid: Uuid,
    pub command_type: String,
    pub temp_id: Option<TempId>,
    pub state: CommandState,
}

/// What happened to every command of one batch.
#[derive(Debug)]
pub struct ExecutionReport {
    outcomes: Vec<CommandOutcome>,
    index: HashMap<Uuid, usize>,
    failures: Vec<CommandFailure>,
    resolver: TempIdResolver,
}

impl ExecutionReport {
    fn collect(commands: Vec<Command>, mut resolver: TempIdResolver, response: SyncResponse) -> Self {
        let mut outcomes = Vec::with_capacity(commands.len());
        let mut index = HashMap::with_capacity(commands.len());
        let mut failures = Vec::new();

        for command in commands {
            let mut outcome = CommandOutcome {
                uuid: command.uuid(),
                command_type: command.command_type().to_string(),
                temp_id: command.temp_id().cloned(),
                state: CommandState::Sent,
            };

            let error = match response.status(command.uuid()) {
                Some(Ok(status)) => status.error().map(|e| (e.error_code, e.error.clone())),
                Some(Err(err)) => Some((MALFORMED_STATUS_CODE, format!("malformed status: {err}"))),
                None => Some((
                    MISSING_STATUS_CODE,
                    "no status returned for command".to_string(),
                )),
            };

            match error {
                None => {
                    outcome.state = CommandState::Applied;
                    if let Some(temp_id) = &outcome.temp_id {
                        match response.temp_id_mapping.get(temp_id) {
                            Some(real_id) => resolver.resolve(temp_id, real_id.as_str()),
                            None => warn!(%temp_id, "applied command returned no id mapping"),
                        }
                    }
                }
                Some((code, message)) => {
                    outcome.state = CommandState::Failed;
                    debug!(uuid = %outcome.uuid, command = %outcome.command_type, code, %message, "command failed");
                    failures.push(CommandFailure {
                        uuid: outcome.uuid,
                        command_type: outcome.command_type.clone(),
                        temp_id: outcome.temp_id.clone(),
                        code,
                        message,
                    });
                }
            }
            index.insert(outcome.uuid, outcomes.len());
            outcomes.push(outcome);
        }

        Self {
            outcomes,
            index,
            failures,
            resolver,
        }
    }

    /// Outcomes in submission order.
    pub fn outcomes(&self) -> &[CommandOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, uuid: Uuid) -> Option<&CommandOutcome> {
        self.index.get(&uuid).map(|&i| &self.outcomes[i])
    }

    pub fn failures(&self) -> &[CommandFailure] {
        &self.failures
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn applied_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == CommandState::Applied)
            .count()
    }

    pub fn resolve(&self, temp_id: &TempId) -> Result<&str, UnresolvedReferenceError> {
        self.resolver.lookup(temp_id)
    }

    pub fn resolve_id(&self, id: &ComplexId) -> Result<String, UnresolvedReferenceError> {
        self.resolver.lookup_id(id)
    }

    pub fn resolver(&self) -> &TempIdResolver {
        &self.resolver
    }
}

/// Shared cancellation signal. Clones observe the same signal, and once
/// cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Completes once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends command batches through a `Transport`.
#[derive(Debug, Clone)]
pub struct CommandExecutor<T> {
    client: TodoistClient,
    transport: T,
}

impl<T: Transport> CommandExecutor<T> {
    pub fn new(client: TodoistClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &TodoistClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn items(&self) -> ItemsService<'_, T> {
        ItemsService::new(self)
    }

    pub fn projects(&self) -> ProjectsService<'_, T> {
        ProjectsService::new(self)
    }

    /// Validate `commands` as one batch and execute it.
    pub async fn submit(&self, commands: Vec<Command>) -> Result<ExecutionReport, ApiError> {
        let batch = CommandBatch::try_from(commands)?;
        self.execute(batch).await
    }

    /// `submit` with a cancellation signal, see `execute_with_cancel`.
    pub async fn submit_with_cancel<F>(
        &self,
        commands: Vec<Command>,
        cancel: F,
    ) -> Result<ExecutionReport, ApiError>
    where
        F: Future<Output = ()>,
    {
        let batch = CommandBatch::try_from(commands)?;
        self.execute_with_cancel(batch, cancel).await
    }

    pub async fn execute(&self, batch: CommandBatch) -> Result<ExecutionReport, ApiError> {
        self.execute_with_cancel(batch, std::future::pending()).await
    }

    /// Execute `batch`, giving up with `TransportError::Cancelled` as soon as
    /// `cancel` completes. A cancelled batch may or may not have been applied
    /// by the server.
    #[tracing::instrument(skip_all, fields(commands = batch.len()))]
    pub async fn execute_with_cancel<F>(
        &self,
        batch: CommandBatch,
        cancel: F,
    ) -> Result<ExecutionReport, ApiError>
    where
        F: Future<Output = ()>,
    {
        let payload = batch.build()?;
        let request = self.client.build_sync(&payload)?;
        let (commands, resolver) = payload.into_parts();

        debug!("sending batch");
        let response = tokio::select! {
            biased;
            () = cancel => {
                warn!("batch cancelled before a response was parsed");
                return Err(TransportError::Cancelled.into());
            }
            response = self.transport.send(request) => response?,
        };

        let sync = self.client.parse_sync(response)?;
        let report = ExecutionReport::collect(commands, resolver, sync);
        debug!(
            applied = report.applied_count(),
            failed = report.failures().len(),
            "batch processed"
        );

        if report.is_success() {
            Ok(report)
        } else {
            Err(BatchCommandError::new(report).into())
        }
    }
}
