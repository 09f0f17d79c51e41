//! Commands and the identifiers they carry.
//!
//! # Design
//! A `Command` is built once and never mutated: fields are private and only
//! exposed through getters, so a command cannot change after it was pushed
//! into a `CommandBatch`. Arguments are kept as a `serde_json::Value` object
//! because the batching engine never looks inside them.
//!
//! Commands that create an entity carry a `TempId`. Later commands in the same
//! batch can refer to that entity through `ComplexId::Temp` before the server
//! has assigned its real id.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::{ApiError, ValidationError};

/// Client-generated placeholder id for an entity that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(String);

impl TempId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// A fresh random temp id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TempId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An entity id that is either already known or still a temp id.
///
/// Both variants serialize as a bare JSON string; the server accepts a temp id
/// wherever a real id is expected as long as the creating command was sent
/// earlier in the same batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComplexId {
    Real(String),
    Temp(TempId),
}

impl ComplexId {
    pub fn real(id: impl Into<String>) -> Self {
        Self::Real(id.into())
    }

    pub fn is_temp(&self) -> bool {
        matches!(self, Self::Temp(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Real(id) => id,
            Self::Temp(temp) => temp.as_str(),
        }
    }
}

impl fmt::Display for ComplexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TempId> for ComplexId {
    fn from(value: TempId) -> Self {
        Self::Temp(value)
    }
}

impl From<&str> for ComplexId {
    fn from(value: &str) -> Self {
        Self::Real(value.to_string())
    }
}

impl From<String> for ComplexId {
    fn from(value: String) -> Self {
        Self::Real(value)
    }
}

impl Serialize for ComplexId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ComplexId {
    /// Ids coming back from the server are always real.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::types::deserialize_id(deserializer).map(Self::Real)
    }
}

/// Lifecycle of a single command: `Enqueued -> Sent -> {Applied | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Enqueued,
    Sent,
    Applied,
    Failed,
}

impl CommandState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Applied | Self::Failed)
    }
}

/// A single named operation, as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    #[serde(rename = "type")]
    command_type: String,
    uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    temp_id: Option<TempId>,
    args: serde_json::Value,
}

impl Command {
    /// Build a command that acts on existing entities.
    pub fn new(command_type: impl Into<String>, args: &impl Serialize) -> Result<Self, ApiError> {
        Self::build(command_type.into(), None, args)
    }

    /// Build a command that creates an entity identified by `temp_id` until the
    /// server assigns a real id.
    pub fn create(
        command_type: impl Into<String>,
        temp_id: TempId,
        args: &impl Serialize,
    ) -> Result<Self, ApiError> {
        Self::build(command_type.into(), Some(temp_id), args)
    }

    fn build(
        command_type: String,
        temp_id: Option<TempId>,
        args: &impl Serialize,
    ) -> Result<Self, ApiError> {
        let args = serde_json::to_value(args).map_err(|e| ApiError::Serialization(e.to_string()))?;
        if !args.is_object() {
            return Err(ValidationError::InvalidArgs { command_type }.into());
        }
        Ok(Self {
            command_type,
            uuid: Uuid::new_v4(),
            temp_id,
            args,
        })
    }

    /// Replace the generated uuid. Useful when the caller needs a stable uuid,
    /// e.g. to replay a command.
    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn command_type(&self) -> &str {
        &self.command_type
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn temp_id(&self) -> Option<&TempId> {
        self.temp_id.as_ref()
    }

    pub fn args(&self) -> &serde_json::Value {
        &self.args
    }
}
