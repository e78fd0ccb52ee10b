//! Route handlers. Each one validates its input, runs a single store call on
//! the blocking pool, and maps the outcome onto a status code. A missing todo
//! is a 404; a storage fault is a 500 and bumps the storage error counter.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use todo_store::{StorageFault, Todo, TodoStats, TodoStore};

use crate::error::ApiError;
use crate::models::{CreateTodo, UpdateTodo};
use crate::AppState;

/// Run a synchronous store call on the blocking pool.
async fn with_store<T, F>(state: &AppState, f: F) -> Result<Result<T, StorageFault>, ApiError>
where
    F: FnOnce(&TodoStore) -> Result<T, StorageFault> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    let result = tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if result.is_err() {
        state.metrics.storage_error();
    }
    Ok(result)
}

/// Like `with_store`, with a storage fault reported as `detail`.
async fn run_store<T, F>(state: &AppState, detail: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&TodoStore) -> Result<T, StorageFault> + Send + 'static,
    T: Send + 'static,
{
    with_store(state, f)
        .await?
        .map_err(|source| ApiError::Storage { detail, source })
}

pub async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = run_store(&state, "Failed to retrieve todos", |store| store.list_all()).await?;
    Ok(Json(todos))
}

pub async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let Json(input) = payload?;
    let new_todo = input.into_new_todo()?;
    let todo = run_store(&state, "Failed to create todo", move |store| {
        store.create(&new_todo)
    })
    .await?;
    state.metrics.todo_created();
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn get_todo(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Path(id) = path?;
    run_store(&state, "Failed to retrieve todo", move |store| store.get(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn update_todo(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTodo>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let patch = input.into_patch()?;
    let writes = !patch.is_empty();
    let todo = run_store(&state, "Failed to update todo", move |store| {
        store.update(id, &patch)
    })
    .await?
    .ok_or(ApiError::NotFound)?;
    if writes {
        state.metrics.todo_updated();
    }
    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = path?;
    let deleted = run_store(&state, "Failed to delete todo", move |store| store.delete(id)).await?;
    if !deleted {
        return Err(ApiError::NotFound);
    }
    state.metrics.todo_deleted();
    Ok(Json(json!({ "message": "Todo deleted successfully" })))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<TodoStats>, ApiError> {
    let stats = run_store(&state, "Failed to retrieve stats", |store| store.stats()).await?;
    Ok(Json(stats))
}

/// Healthy only if the store answers a stats query.
pub async fn health(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>), ApiError> {
    match with_store(&state, |store| store.stats()).await? {
        Ok(_) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected",
                "app": state.info.name,
                "version": state.info.version,
            })),
        )),
        Err(fault) => {
            log::warn!("health check failed: {fault}");
            Ok((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": "disconnected",
                    "error": fault.to_string(),
                })),
            ))
        }
    }
}

/// Todo gauges are refreshed from the store on every scrape.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = match with_store(&state, |store| store.stats()).await? {
        Ok(stats) => Some(stats),
        Err(fault) => {
            log::warn!("metrics scrape could not read stats: {fault}");
            None
        }
    };
    let body = state.metrics.render(stats)?;
    Ok(([(header::CONTENT_TYPE, state.metrics.content_type())], body))
}
