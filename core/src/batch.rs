//! Ordered, single-use batch of commands.
//!
//! # Design
//! Order is part of the contract: a later command may reference the temp id
//! of an earlier one, and the server applies commands in submission order.
//! `build` consumes the batch so it cannot be submitted twice.

use std::collections::HashSet;

use uuid::Uuid;

use crate::command::{Command, CommandState, TempId};
use crate::error::{ApiError, ValidationError};
use crate::resolver::TempIdResolver;

#[derive(Debug, Default)]
pub struct CommandBatch {
    commands: Vec<Command>,
    uuids: HashSet<Uuid>,
    resolver: TempIdResolver,
}

impl CommandBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `command`. Temp ids and uuids must be unique within the batch.
    pub fn add(&mut self, command: Command) -> Result<&mut Self, ValidationError> {
        if self.uuids.contains(&command.uuid()) {
            return Err(ValidationError::DuplicateUuid(command.uuid()));
        }
        if let Some(temp_id) = command.temp_id() {
            self.resolver.register(temp_id.clone())?;
        }
        self.uuids.insert(command.uuid());
        self.commands.push(command);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Every queued command is `Enqueued`; `None` if `uuid` is not in the batch.
    pub fn state(&self, uuid: Uuid) -> Option<CommandState> {
        self.uuids.contains(&uuid).then_some(CommandState::Enqueued)
    }

    /// Freeze the batch into its wire payload.
    pub fn build(self) -> Result<BatchPayload, ValidationError> {
        if self.commands.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }
        Ok(BatchPayload {
            commands: self.commands,
            resolver: self.resolver,
        })
    }
}

impl TryFrom<Vec<Command>> for CommandBatch {
    type Error = ValidationError;

    fn try_from(commands: Vec<Command>) -> Result<Self, Self::Error> {
        let mut batch = Self::new();
        for command in commands {
            batch.add(command)?;
        }
        Ok(batch)
    }
}

/// A validated, non-empty batch ready to be sent.
///
/// Carries the resolver with one unresolved slot per creating command.
#[derive(Debug)]
pub struct BatchPayload {
    commands: Vec<Command>,
    resolver: TempIdResolver,
}

impl BatchPayload {
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn temp_ids(&self) -> impl Iterator<Item = &TempId> {
        self.commands.iter().filter_map(Command::temp_id)
    }

    /// The JSON array sent as the request body.
    pub fn to_json(&self) -> Result<String, ApiError> {
        serde_json::to_string(&self.commands).map_err(|e| ApiError::Serialization(e.to_string()))
    }

    pub(crate) fn into_parts(self) -> (Vec<Command>, TempIdResolver) {
        (self.commands, self.resolver)
    }
}
