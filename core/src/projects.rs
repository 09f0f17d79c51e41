//! Project commands.

use serde::Serialize;

use crate::command::{Command, ComplexId, TempId};
use crate::error::ApiError;
use crate::executor::{CancelToken, CommandExecutor, ExecutionReport};
use crate::http::Transport;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ComplexId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_style: Option<String>,
}

impl AddProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateProject {
    pub id: ComplexId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

#[derive(Serialize)]
struct IdArgs<'a> {
    id: &'a ComplexId,
}

pub fn add(temp_id: TempId, project: &AddProject) -> Result<Command, ApiError> {
    Command::create("project_add", temp_id, project)
}

pub fn update(project: &UpdateProject) -> Result<Command, ApiError> {
    Command::new("project_update", project)
}

/// Deletes the project and everything in it.
pub fn delete(id: &ComplexId) -> Result<Command, ApiError> {
    Command::new("project_delete", &IdArgs { id })
}

pub fn archive(id: &ComplexId) -> Result<Command, ApiError> {
    Command::new("project_archive", &IdArgs { id })
}

pub fn unarchive(id: &ComplexId) -> Result<Command, ApiError> {
    Command::new("project_unarchive", &IdArgs { id })
}

pub struct ProjectsService<'a, T> {
    executor: &'a CommandExecutor<T>,
    cancel: Option<CancelToken>,
}

impl<'a, T: Transport> ProjectsService<'a, T> {
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

    /// Add a project and return its real id.
    pub async fn add(&self, project: &AddProject) -> Result<String, ApiError> {
        let temp_id = TempId::generate();
        let report = self.submit(add(temp_id.clone(), project)?).await?;
        Ok(report.resolve(&temp_id)?.to_string())
    }

    pub async fn update(&self, project: &UpdateProject) -> Result<(), ApiError> {
        self.run(update(project)?).await
    }

    pub async fn delete(&self, id: impl Into<ComplexId>) -> Result<(), ApiError> {
        self.run(delete(&id.into())?).await
    }

    pub async fn archive(&self, id: impl Into<ComplexId>) -> Result<(), ApiError> {
        self.run(archive(&id.into())?).await
    }

    pub async fn unarchive(&self, id: impl Into<ComplexId>) -> Result<(), ApiError> {
        self.run(unarchive(&id.into())?).await
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
