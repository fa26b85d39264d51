use crate::domain::task::driven_ports::{TaskReader, TaskWriter};
use crate::domain::task::driving_ports::TaskPort;
use crate::external_connections::Transactable;
use crate::routing_utils::{BasicErrorResponse, Json, TaskErrorResponse, ValidationErrorResponse};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{get, put};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;
use validator::Validate;

#[derive(OpenApi)]
#[openapi(paths(list_tasks, create_task, update_task, delete_task))]
/// Defines the OpenAPI documentation for the tasks API
pub struct TaskApi;
/// Constant used to group task endpoints in OpenAPI documentation
pub const TASK_API_GROUP: &str = "Tasks";

/// Builds the router for everything under "/api/tasks"
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(|State(app_state): AppState| async move {
                let task_service = domain::task::TaskService {};
                let task_reader = persistence::db_task_driven_ports::DbTaskReader;

                list_tasks(&app_state.ext_cxn, &task_service, &task_reader).await
            })
            .post(
                |State(app_state): AppState, Json(new_task): Json<dto::NewTask>| async move {
                    let task_service = domain::task::TaskService {};
                    let task_writer = persistence::db_task_driven_ports::DbTaskWriter;

                    create_task(new_task, &app_state.ext_cxn, &task_service, &task_writer).await
                },
            ),
        )
        .route(
            "/:task_id",
            put(
                |State(app_state): AppState,
                 Path(task_id): Path<Uuid>,
                 Json(patch): Json<dto::TaskPatch>| async move {
                    let task_service = domain::task::TaskService {};
                    let task_writer = persistence::db_task_driven_ports::DbTaskWriter;

                    update_task(task_id, patch, &app_state.ext_cxn, &task_service, &task_writer)
                        .await
                },
            )
            .delete(
                |State(app_state): AppState, Path(task_id): Path<Uuid>| async move {
                    let task_service = domain::task::TaskService {};
                    let task_writer = persistence::db_task_driven_ports::DbTaskWriter;

                    delete_task(task_id, &app_state.ext_cxn, &task_service, &task_writer).await
                },
            ),
        )
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = TASK_API_GROUP,
    responses(
        (status = 200, description = "All tasks, earliest due date first", body = Vec<dto::Task>),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Retrieves every task
async fn list_tasks(
    ext_cxn: &impl Transactable,
    task_service: &impl TaskPort,
    task_read: &impl TaskReader,
) -> Result<Json<Vec<dto::Task>>, ErrorResponse> {
    info!("Listing tasks");
    let tasks = task_service
        .list_tasks(ext_cxn, task_read)
        .await
        .map_err(TaskErrorResponse::from)?;

    Ok(Json(tasks.into_iter().map(dto::Task::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = TASK_API_GROUP,
    request_body = dto::NewTask,
    responses(
        (status = 201, description = "Task was created", body = dto::Task),
        (status = 422, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Creates a task. The id and year are filled in by the server.
async fn create_task(
    new_task: dto::NewTask,
    ext_cxn: &impl Transactable,
    task_service: &impl TaskPort,
    task_write: &impl TaskWriter,
) -> Result<(StatusCode, Json<dto::Task>), ErrorResponse> {
    info!("Creating task \"{}\"", new_task.title);
    new_task
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let domain_task = domain::task::NewTask::from(new_task);
    let created_task = task_service
        .create_task(&domain_task, ext_cxn, task_write)
        .await
        .map_err(TaskErrorResponse::from)?;

    Ok((StatusCode::CREATED, Json(dto::Task::from(created_task))))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(
        ("task_id" = Uuid, Path, description = "The ID of the task to update"),
    ),
    request_body = dto::TaskPatch,
    responses(
        (status = 200, description = "Task was updated", body = dto::Task),
        (status = 404, response = BasicErrorResponse),
        (status = 422, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Updates the fields of a task present in the request body
async fn update_task(
    task_id: Uuid,
    patch: dto::TaskPatch,
    ext_cxn: &impl Transactable,
    task_service: &impl TaskPort,
    task_write: &impl TaskWriter,
) -> Result<Json<dto::Task>, ErrorResponse> {
    info!("Updating task {task_id}");
    patch.validate().map_err(ValidationErrorResponse::from)?;

    let domain_patch = domain::task::TaskPatch::from(patch);
    let updated_task = task_service
        .update_task(task_id, &domain_patch, ext_cxn, task_write)
        .await
        .map_err(TaskErrorResponse::from)?;

    Ok(Json(dto::Task::from(updated_task)))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(
        ("task_id" = Uuid, Path, description = "The ID of the task to delete"),
    ),
    responses(
        (status = 204, description = "Task was deleted"),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Permanently removes a task
async fn delete_task(
    task_id: Uuid,
    ext_cxn: &impl Transactable,
    task_service: &impl TaskPort,
    task_write: &impl TaskWriter,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting task {task_id}");
    task_service
        .delete_task(task_id, ext_cxn, task_write)
        .await
        .map_err(TaskErrorResponse::from)?;

    Ok(StatusCode::NO_CONTENT)
}
