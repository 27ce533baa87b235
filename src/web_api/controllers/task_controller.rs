use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    api_response::ApiResponse,
    app_state::AppState,
    change_status_request::ChangeStatusRequest,
    create_task_request::CreateTaskRequest,
    task::{NewTask, TaskChanges, TaskId},
    task_status::TaskStatus,
    update_task_request::UpdateTaskRequest,
    web_api::{api_error::ApiError, controllers::RequestContext, router::PathParams},
};

pub struct TaskController {}

impl TaskController {
    pub async fn index(state: &AppState, request: RequestContext) -> Result<Response, ApiError> {
        let tasks = state.tasks.list().await?;
        let resources = request.resolver.resolve_many(tasks);
        Ok(Json(ApiResponse::list(resources)).into_response())
    }

    pub async fn show(state: &AppState, request: RequestContext) -> Result<Response, ApiError> {
        let id = task_id(&request.params)?;
        let task = state.tasks.find(id).await?;
        match request.resolver.resolve(task) {
            Some(resource) => Ok(Json(ApiResponse::data(resource)).into_response()),
            None => Err(ApiError::NotFound),
        }
    }

    pub async fn store(state: &AppState, request: RequestContext) -> Result<Response, ApiError> {
        let body: CreateTaskRequest = parse_input(request.input)?;

        let title = body.title().unwrap_or_default();
        if title.trim().is_empty() {
            return Err(ApiError::bad_request("Title is required"));
        }
        // Unknown statuses on create fall back to the default instead of failing.
        let status = match body.status().map(str::parse::<TaskStatus>) {
            Some(Ok(status)) => status,
            None if body.status.is_none() => TaskStatus::default(),
            _ => {
                tracing::debug!(status = ?body.status, "unknown status on create, using default");
                TaskStatus::default()
            }
        };

        let new_task = NewTask::new(title)
            .with_body(body.body())
            .with_status(status);
        let task = state.tasks.create(new_task).await?;

        let response = ApiResponse::with_message("Task created", request.resolver.resolve_task(task));
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    pub async fn update(state: &AppState, request: RequestContext) -> Result<Response, ApiError> {
        let id = task_id(&request.params)?;
        if request.input.is_empty() {
            return Err(ApiError::bad_request("No data provided"));
        }
        let body: UpdateTaskRequest = parse_input(request.input)?;

        if body.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
            return Err(ApiError::bad_request("Title cannot be empty"));
        }
        let changes = TaskChanges {
            title: body.title,
            body: body.body,
            status: body.status.as_deref().map(parse_status).transpose()?,
        };
        if changes.is_empty() {
            return Err(ApiError::bad_request("Nothing to update"));
        }

        let task = state.tasks.update(id, changes).await?;
        let response = ApiResponse::with_message("Task updated", request.resolver.resolve_task(task));
        Ok(Json(response).into_response())
    }

    pub async fn change_status(state: &AppState, request: RequestContext) -> Result<Response, ApiError> {
        let id = task_id(&request.params)?;
        if request.input.is_empty() {
            return Err(ApiError::bad_request("No data provided"));
        }
        let body: ChangeStatusRequest = parse_input(request.input)?;

        let Some(raw) = body.status else {
            return Err(ApiError::bad_request("Status is required"));
        };
        let status = parse_status(&raw)?;

        let task = state.tasks.update(id, TaskChanges::status(status)).await?;
        let response = ApiResponse::with_message("Task updated", request.resolver.resolve_task(task));
        Ok(Json(response).into_response())
    }

    pub async fn destroy(state: &AppState, request: RequestContext) -> Result<Response, ApiError> {
        let id = task_id(&request.params)?;
        state.tasks.delete(id).await?;
        Ok(Json(ApiResponse::<()>::message("Task deleted")).into_response())
    }
}

/// Positive integer written as plain ASCII digits. Signs, spaces and
/// anything beyond `i64::MAX` are rejected.
fn task_id(params: &PathParams) -> Result<TaskId, ApiError> {
    params
        .get("id")
        .filter(|raw| !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|raw| raw.parse::<TaskId>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request("Invalid ID"))
}

fn parse_status(raw: &str) -> Result<TaskStatus, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request("Invalid status"))
}

fn parse_input<T: DeserializeOwned>(input: Map<String, Value>) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(input))
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))
}
