//! Task (item) commands.
//!
//! The free functions build `Command`s that can be mixed into any batch.
//! `ItemsService` sends each one as its own single-command batch.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::command::{Command, ComplexId, TempId};
use crate::error::{ApiError, ValidationError};
use crate::executor::{CancelToken, CommandExecutor, ExecutionReport};
use crate::http::Transport;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DueDate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl DueDate {
    /// Due date in natural language, e.g. `"every monday"`.
    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            string: Some(value.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddItem {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ComplexId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<ComplexId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ComplexId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DueDate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_order: Option<i32>,
}

impl AddItem {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn in_project(mut self, project_id: impl Into<ComplexId>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }
}

/// Only the fields that are set are sent; the rest stay unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateItem {
    pub id: ComplexId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DueDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl UpdateItem {
    pub fn new(id: impl Into<ComplexId>) -> Self {
        Self {
            id: id.into(),
            content: None,
            description: None,
            priority: None,
            due: None,
            labels: None,
        }
    }
}

/// Where `item_move` puts the task. Exactly one target is sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MoveTarget {
    #[serde(rename = "project_id")]
    Project(ComplexId),
    #[serde(rename = "section_id")]
    Section(ComplexId),
    #[serde(rename = "parent_id")]
    Parent(ComplexId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveItem {
    pub id: ComplexId,
    #[serde(flatten)]
    pub target: MoveTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompleteItem {
    pub id: ComplexId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_completed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_history: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompleteRecurringItem {
    pub id: ComplexId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DueDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_subtasks: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReorderEntry {
    pub id: ComplexId,
    pub child_order: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayOrderEntry {
    pub id: ComplexId,
    pub day_order: i32,
}

#[derive(Serialize)]
struct IdArgs<'a> {
    id: &'a ComplexId,
}

pub fn add(temp_id: TempId, item: &AddItem) -> Result<Command, ApiError> {
    Command::create("item_add", temp_id, item)
}

pub fn update(item: &UpdateItem) -> Result<Command, ApiError> {
    Command::new("item_update", item)
}

pub fn delete(id: &ComplexId) -> Result<Command, ApiError> {
    Command::new("item_delete", &IdArgs { id })
}

/// Does what the official clients do on "close": completes a regular task,
/// checks a subtask, moves a recurring task to its next date.
pub fn close(id: &ComplexId) -> Result<Command, ApiError> {
    Command::new("item_close", &IdArgs { id })
}

pub fn complete(args: &CompleteItem) -> Result<Command, ApiError> {
    Command::new("item_complete", args)
}

pub fn uncomplete(id: &ComplexId) -> Result<Command, ApiError> {
    Command::new("item_uncomplete", &IdArgs { id })
}

pub fn complete_recurring(args: &CompleteRecurringItem) -> Result<Command, ApiError> {
    Command::new("item_update_date_complete", args)
}

pub fn move_item(args: &MoveItem) -> Result<Command, ApiError> {
    Command::new("item_move", args)
}

pub fn reorder(entries: &[ReorderEntry]) -> Result<Command, ApiError> {
    if entries.is_empty() {
        return Err(ValidationError::EmptyArgument("item_reorder").into());
    }
    #[derive(Serialize)]
    struct Args<'a> {
        items: &'a [ReorderEntry],
    }
    Command::new("item_reorder", &Args { items: entries })
}

pub fn update_day_orders(entries: &[DayOrderEntry]) -> Result<Command, ApiError> {
    if entries.is_empty() {
        return Err(ValidationError::EmptyArgument("item_update_day_orders").into());
    }
    #[derive(Serialize)]
    struct Args<'a> {
        ids_to_orders: BTreeMap<&'a str, i32>,
    }
    let ids_to_orders = entries
        .iter()
        .map(|entry| (entry.id.as_str(), entry.day_order))
        .collect();
    Command::new("item_update_day_orders", &Args { ids_to_orders })
}

/// Item operations, one request each.
pub struct ItemsService<'a, T> {
    executor: &'a CommandExecutor<T>,
    cancel: Option<CancelToken>,
}

impl<'a, T: Transport> ItemsService<'a, T> {
    pub(crate) fn new(executor: &'a CommandExecutor<T>) -> Self {
        Self {
            executor,
            cancel: None,
        }
    }

    /// Abort calls made through this service once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Add a task and return its real id.
    pub async fn add(&self, item: &AddItem) -> Result<String, ApiError> {
        let temp_id = TempId::generate();
        let report = self.submit(add(temp_id.clone(), item)?).await?;
        Ok(report.resolve(&temp_id)?.to_string())
    }

    pub async fn update(&self, item: &UpdateItem) -> Result<(), ApiError> {
        self.run(update(item)?).await
    }

    pub async fn delete(&self, id: impl Into<ComplexId>) -> Result<(), ApiError> {
        self.run(delete(&id.into())?).await
    }

    pub async fn close(&self, id: impl Into<ComplexId>) -> Result<(), ApiError> {
        self.run(close(&id.into())?).await
    }

    pub async fn complete(&self, args: &CompleteItem) -> Result<(), ApiError> {
        self.run(complete(args)?).await
    }

    pub async fn uncomplete(&self, id: impl Into<ComplexId>) -> Result<(), ApiError> {
        self.run(uncomplete(&id.into())?).await
    }

    pub async fn complete_recurring(&self, args: &CompleteRecurringItem) -> Result<(), ApiError> {
        self.run(complete_recurring(args)?).await
    }

    pub async fn move_item(&self, args: &MoveItem) -> Result<(), ApiError> {
        self.run(move_item(args)?).await
    }

    pub async fn reorder(&self, entries: &[ReorderEntry]) -> Result<(), ApiError> {
        self.run(reorder(entries)?).await
    }

    pub async fn update_day_orders(&self, entries: &[DayOrderEntry]) -> Result<(), ApiError> {
        self.run(update_day_orders(entries)?).await
    }

    async fn run(&self, command: Command) -> Result<(), ApiError> {
        self.submit(command).await.map(|_| ())
    }

    async fn submit(&self, command: Command) -> Result<ExecutionReport, ApiError> {
        match &self.cancel {
            Some(token) => {
                self.executor
                    .submit_with_cancel(vec![command], token.cancelled())
                    .await
            }
            None => self.executor.submit(vec![command]).await,
        }
    }
}
