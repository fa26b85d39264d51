use crate::domain::task::driven_ports::{TaskReader, TaskWriter};
use crate::domain::task::driving_ports::TaskError;
use crate::external_connections::{Transactable, TransactionHandle};
use anyhow::Context;
use chrono::{DateTime, Datelike, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

/// A task as stored in the tasks table
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
    /// Derived from [Task::due_date]. Only absent on rows written before the column existed
    /// which the startup backfill could not fill in.
    pub year: Option<i32>,
}

/// Caller-supplied content for a brand new task
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
}

/// A partial update to a task. `None` means "leave the field alone". For the nullable
/// description, `Some(None)` clears the stored value.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: Option<bool>,
}

/// The set of column changes handed to persistence for a [TaskPatch]. Unlike the patch,
/// this carries the recomputed year whenever the due date moves.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: Option<bool>,
    pub year: Option<i32>,
}

impl From<&TaskPatch> for TaskUpdate {
    fn from(patch: &TaskPatch) -> Self {
        TaskUpdate {
            title: patch.title.clone(),
            description: patch.description.clone(),
            due_date: patch.due_date,
            is_completed: patch.is_completed,
            year: patch.due_date.as_ref().map(year_of),
        }
    }
}

/// The year a task belongs to. Always taken from the UTC representation so it agrees with
/// the due date the API hands back.
pub fn year_of(due_date: &DateTime<Utc>) -> i32 {
    due_date.year()
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait TaskReader {
        /// All tasks, earliest due date first
        async fn all_tasks(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;
    }

    pub trait TaskWriter {
        /// Stores the task and returns the row as persisted
        async fn insert_task(
            &self,
            task: &Task,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Task, anyhow::Error>;

        /// Applies the update and returns the resulting row, or `None` if no task has the given id
        async fn update_task(
            &self,
            task_id: Uuid,
            update: &TaskUpdate,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;

        /// Removes the task, returning whether a row was actually deleted
        async fn delete_task(
            &self,
            task_id: Uuid,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("task {0} does not exist")]
        NotFound(Uuid),
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    /// Task operations offered to the API. Every operation runs in its own unit-of-work.
    pub trait TaskPort {
        async fn list_tasks(
            &self,
            ext_cxn: &impl Transactable,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, TaskError>;
        async fn create_task(
            &self,
            new_task: &NewTask,
            ext_cxn: &impl Transactable,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
        async fn update_task(
            &self,
            task_id: Uuid,
            patch: &TaskPatch,
            ext_cxn: &impl Transactable,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
        async fn delete_task(
            &self,
            task_id: Uuid,
            ext_cxn: &impl Transactable,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    #[instrument(skip_all)]
    async fn list_tasks(
        &self,
        ext_cxn: &impl Transactable,
        task_read: &impl TaskReader,
    ) -> Result<Vec<Task>, TaskError> {
        let mut txn = ext_cxn.start_transaction().await?;
        let tasks = task_read
            .all_tasks(&mut txn)
            .await
            .context("listing tasks")?;
        txn.commit().await?;

        debug!(count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    #[instrument(skip_all)]
    async fn create_task(
        &self,
        new_task: &NewTask,
        ext_cxn: &impl Transactable,
        task_write: &impl TaskWriter,
    ) -> Result<Task, TaskError> {
        let task = Task {
            id: Uuid::new_v4(),
            title: new_task.title.clone(),
            description: new_task.description.clone(),
            due_date: new_task.due_date,
            is_completed: new_task.is_completed,
            year: Some(year_of(&new_task.due_date)),
        };

        let mut txn = ext_cxn.start_transaction().await?;
        let stored_task = task_write
            .insert_task(&task, &mut txn)
            .await
            .context("creating a task")?;
        txn.commit().await?;

        debug!(task_id = %stored_task.id, "Created task");
        Ok(stored_task)
    }

    #[instrument(skip_all, fields(task_id = %task_id))]
    async fn update_task(
        &self,
        task_id: Uuid,
        patch: &TaskPatch,
        ext_cxn: &impl Transactable,
        task_write: &impl TaskWriter,
    ) -> Result<Task, TaskError> {
        let update = TaskUpdate::from(patch);

        let mut txn = ext_cxn.start_transaction().await?;
        let updated_task = task_write
            .update_task(task_id, &update, &mut txn)
            .await
            .context("updating a task")?
            .ok_or(TaskError::NotFound(task_id))?;
        txn.commit().await?;

        Ok(updated_task)
    }

    #[instrument(skip_all, fields(task_id = %task_id))]
    async fn delete_task(
        &self,
        task_id: Uuid,
        ext_cxn: &impl Transactable,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let mut txn = ext_cxn.start_transaction().await?;
        let deleted = task_write
            .delete_task(task_id, &mut txn)
            .await
            .context("deleting a task")?;
        if !deleted {
            return Err(TaskError::NotFound(task_id));
        }
        txn.commit().await?;

        Ok(())
    }
}
