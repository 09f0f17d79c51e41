//! Wire DTOs for the sync endpoint response.
//!
//! # Design
//! These types mirror what the server sends and nothing more. Correlation
//! with the submitted commands happens in the executor. Real ids are
//! normalised to `String` because the API has used both numeric and string
//! ids.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::command::TempId;

/// Body of a successful `POST /sync`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SyncResponse {
    #[serde(default)]
    pub sync_status: HashMap<String, serde_json::Value>,
    #[serde(default, deserialize_with = "deserialize_id_mapping")]
    pub temp_id_mapping: HashMap<TempId, String>,
}

impl SyncResponse {
    /// Decoded status of the command with `uuid`, or `None` when the server
    /// returned no entry for it.
    pub fn status(&self, uuid: Uuid) -> Option<Result<CommandStatus, serde_json::Error>> {
        self.sync_status
            .get(&uuid.to_string())
            .map(|raw| CommandStatus::deserialize(raw))
    }
}

/// Per-command status. Commands acting on several objects at once report one
/// status per object id.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CommandStatus {
    Ok(OkMarker),
    Error(CommandError),
    PerObject(BTreeMap<String, CommandStatus>),
}

/// The literal `"ok"` success marker.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum OkMarker {
    #[serde(rename = "ok")]
    Ok,
}

impl CommandStatus {
    /// First error in the status tree, by object id order.
    pub fn error(&self) -> Option<&CommandError> {
        match self {
            Self::Ok(_) => None,
            Self::Error(err) => Some(err),
            Self::PerObject(statuses) => statuses.values().find_map(CommandStatus::error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error().is_none()
    }
}

/// A command rejection as reported by the server.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CommandError {
    pub error_code: i64,
    pub error: String,
    #[serde(default)]
    pub http_code: Option<u16>,
    #[serde(default)]
    pub error_extra: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Str(String),
    Int(i64),
    UInt(u64),
}

impl From<WireId> for String {
    fn from(value: WireId) -> Self {
        match value {
            WireId::Str(s) => s,
            WireId::Int(n) => n.to_string(),
            WireId::UInt(n) => n.to_string(),
        }
    }
}

/// Accept an id given either as a JSON string or a JSON integer.
pub(crate) fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    WireId::deserialize(deserializer).map(String::from)
}

fn deserialize_id_mapping<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<HashMap<TempId, String>, D::Error> {
    let raw = HashMap::<TempId, WireId>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}
