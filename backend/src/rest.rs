use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use shared::{
    CreateTodoRequest, DeleteTodoResponse, ListTodosRequest, StatusUpdateResponse,
    UpdateTodoRequest,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{TodoError, TodoStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: TodoStore,
}

impl AppState {
    /// Create new application state around the given store
    pub fn new(store: TodoStore) -> Self {
        Self { store }
    }
}

/// Query parameters for the search endpoint
#[derive(Deserialize, Debug)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Build the full application router around a store
///
/// Kept separate from process startup so tests can drive the router
/// in-process without binding a socket.
pub fn app(store: TodoStore) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/search", get(search_todos))
        .route("/todos/stats/summary", get(todo_stats))
        .route(
            "/todos/:id",
            get(get_todo).put(update_todo).patch(update_todo).delete(delete_todo),
        )
        .route("/todos/:id/complete", patch(mark_todo_complete))
        .route("/todos/:id/start", patch(start_todo))
        .with_state(AppState::new(store))
}

/// Map a store error onto its HTTP status and a `{detail}` body
fn error_response(err: TodoError) -> Response {
    let status = match err {
        TodoError::NotFound(_) => StatusCode::NOT_FOUND,
        TodoError::InvalidTitle | TodoError::InvalidDescription => StatusCode::UNPROCESSABLE_ENTITY,
        TodoError::EmptyQuery => StatusCode::BAD_REQUEST,
    };
    warn!("Request failed: {}", err);
    (status, Json(json!({ "detail": err.to_string() }))).into_response()
}

/// Axum handler for GET /
async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to the Todo API",
        "health": "/health",
    }))
}

/// Axum handler for GET /health
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Axum handler for GET /todos
async fn list_todos(
    State(state): State<AppState>,
    Query(query): Query<ListTodosRequest>,
) -> impl IntoResponse {
    info!("GET /todos - query: {:?}", query);
    let todos = state.store.list(query).await;
    (StatusCode::OK, Json(todos))
}

/// Axum handler for POST /todos
async fn create_todo(
    State(state): State<AppState>,
    Json(request): Json<CreateTodoRequest>,
) -> Response {
    info!("POST /todos - title: {}", request.title);
    match state.store.create(request).await {
        Ok(todo) => (StatusCode::CREATED, Json(todo)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for GET /todos/:id
async fn get_todo(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    info!("GET /todos/{}", id);
    match state.store.get(id).await {
        Ok(todo) => (StatusCode::OK, Json(todo)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for PUT and PATCH /todos/:id
async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTodoRequest>,
) -> Response {
    info!("Updating /todos/{}", id);
    match state.store.update(id, request).await {
        Ok(todo) => (StatusCode::OK, Json(todo)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for DELETE /todos/:id
async fn delete_todo(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    info!("DELETE /todos/{}", id);
    match state.store.delete(id).await {
        Ok((deleted_todo, remaining_count)) => (
            StatusCode::OK,
            Json(DeleteTodoResponse {
                message: "todo deleted successfully".to_string(),
                deleted_todo,
                remaining_count,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for PATCH /todos/:id/complete
async fn mark_todo_complete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    info!("PATCH /todos/{}/complete", id);
    match state.store.mark_complete(id).await {
        Ok(todo) => (
            StatusCode::OK,
            Json(StatusUpdateResponse {
                message: format!("todo {id} marked as completed"),
                todo,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for PATCH /todos/:id/start
async fn start_todo(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    info!("PATCH /todos/{}/start", id);
    match state.store.mark_in_progress(id).await {
        Ok(todo) => (
            StatusCode::OK,
            Json(StatusUpdateResponse {
                message: format!("todo {id} started"),
                todo,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for GET /todos/search
async fn search_todos(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Response {
    info!("GET /todos/search - query: {:?}", query);
    // A missing `q` gets the same rejection as a blank one
    let q = query.q.unwrap_or_default();
    match state.store.search(&q, query.skip, query.limit).await {
        Ok(found) => (StatusCode::OK, Json(found)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for GET /todos/stats/summary
async fn todo_stats(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /todos/stats/summary");
    let stats = state.store.stats().await;
    (StatusCode::OK, Json(stats))
}
