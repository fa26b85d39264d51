use crate::domain;
use crate::domain::task::{Task, TaskUpdate};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, query, query_as};
use uuid::Uuid;

#[derive(FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    due_date: DateTime<Utc>,
    is_completed: bool,
    year: Option<i32>,
}

impl From<TaskRow> for domain::task::Task {
    fn from(value: TaskRow) -> Self {
        Task {
            id: value.id,
            title: value.title,
            description: value.description,
            due_date: value.due_date,
            is_completed: value.is_completed,
            year: value.year,
        }
    }
}

pub struct DbTaskReader;

impl domain::task::driven_ports::TaskReader for DbTaskReader {
    async fn all_tasks(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<Vec<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let tasks: Vec<Task> = query_as::<_, TaskRow>(
            "SELECT t.id, t.title, t.description, t.due_date, t.is_completed, t.year \
             FROM tasks t ORDER BY t.due_date ASC",
        )
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch all tasks")?
        .into_iter()
        .map(domain::task::Task::from)
        .collect();

        Ok(tasks)
    }
}

pub struct DbTaskWriter;

impl domain::task::driven_ports::TaskWriter for DbTaskWriter {
    async fn insert_task(
        &self,
        task: &Task,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let stored = query_as::<_, TaskRow>(
            "INSERT INTO tasks(id, title, description, due_date, is_completed, year) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, title, description, due_date, is_completed, year",
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.is_completed)
        .bind(task.year)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task into the database")?;

        Ok(stored.into())
    }

    async fn update_task(
        &self,
        task_id: Uuid,
        update: &TaskUpdate,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        // $3 says whether the description should be replaced at all, since $4 may
        // legitimately be NULL
        let updated = query_as::<_, TaskRow>(
            "UPDATE tasks SET \
                title = COALESCE($2, title), \
                description = CASE WHEN $3 THEN $4 ELSE description END, \
                due_date = COALESCE($5, due_date), \
                is_completed = COALESCE($6, is_completed), \
                year = COALESCE($7, year) \
             WHERE id = $1 \
             RETURNING id, title, description, due_date, is_completed, year",
        )
        .bind(task_id)
        .bind(&update.title)
        .bind(update.description.is_some())
        .bind(update.description.clone().flatten())
        .bind(update.due_date)
        .bind(update.is_completed)
        .bind(update.year)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to update a task in the database")?
        .map(domain::task::Task::from);

        Ok(updated)
    }

    async fn delete_task(
        &self,
        task_id: Uuid,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let result = query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(result.rows_affected() > 0)
    }
}
