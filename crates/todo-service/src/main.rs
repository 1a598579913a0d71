use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use serde::Serialize;
use todo_core::{NewTodo, Todo, TodoError, TodoPatch, TodoStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

type SharedStore = Arc<Mutex<TodoStore>>;

/// The uniform response wrapper: success and error bodies alike carry
/// `status`, `message`, and `data` (null when there is no payload).
#[derive(Debug, Clone, Serialize)]
struct Envelope<T>
where
    T: Serialize,
{
    status: &'static str,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Clone)]
struct ApiError(TodoError);

#[derive(Debug, Parser)]
#[command(name = "todo-service")]
#[command(about = "In-memory to-do HTTP service")]
struct Args {
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            TodoError::Validation(_) => StatusCode::BAD_REQUEST,
            TodoError::NotFound => StatusCode::NOT_FOUND,
        };
        let body = Envelope::<()> { status: "error", message: self.0.to_string(), data: None };
        (status, Json(body)).into_response()
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        Self(err)
    }
}

fn success<T>(message: impl Into<String>, data: T) -> Envelope<T>
where
    T: Serialize,
{
    Envelope { status: "success", message: message.into(), data: Some(data) }
}

fn lock(store: &SharedStore) -> MutexGuard<'_, TodoStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A path segment that does not parse as an integer matches no record,
/// so it falls out as the same not-found error as an unknown id.
fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError(TodoError::NotFound))
}

fn app(store: SharedStore) -> Router {
    let api = Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/:id", get(get_todo).put(update_todo).delete(delete_todo));
    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let store = Arc::new(Mutex::new(TodoStore::seeded()));
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!("listening on {}", args.bind);
    axum::serve(listener, app(store)).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("todo_service=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn list_todos(State(store): State<SharedStore>) -> Json<Envelope<Vec<Todo>>> {
    let todos = lock(&store).todos().to_vec();
    Json(success("to-do list retrieved", todos))
}

async fn create_todo(
    State(store): State<SharedStore>,
    Json(input): Json<NewTodo>,
) -> Result<(StatusCode, Json<Envelope<Todo>>), ApiError> {
    let todo = lock(&store).create(input)?;
    Ok((StatusCode::CREATED, Json(success("to-do created", todo))))
}

async fn get_todo(
    State(store): State<SharedStore>,
    Path(raw_id): Path<String>,
) -> Result<Json<Envelope<Todo>>, ApiError> {
    let id = parse_id(&raw_id)?;
    let todo = lock(&store).get(id)?.clone();
    Ok(Json(success("to-do retrieved", todo)))
}

async fn update_todo(
    State(store): State<SharedStore>,
    Path(raw_id): Path<String>,
    Json(patch): Json<TodoPatch>,
) -> Result<Json<Envelope<Todo>>, ApiError> {
    let id = parse_id(&raw_id)?;
    let todo = lock(&store).update(id, patch)?;
    Ok(Json(success("to-do updated", todo)))
}

async fn delete_todo(
    State(store): State<SharedStore>,
    Path(raw_id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let id = parse_id(&raw_id)?;
    lock(&store).delete(id)?;
    Ok(Json(Envelope { status: "success", message: "to-do deleted".to_string(), data: None }))
}
