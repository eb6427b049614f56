//! JSON API over HTTP: `POST /api/<operation>`.
//!
//! Every response is `{ success, data?, error? }`. Client mistakes
//! (unknown addresses, unresolvable paths, malformed bodies) answer 400,
//! everything else 500.

use crate::state::{SharedState, StateError};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use ecu_editor::{
    AddComponent, ComponentInfo, CreateComponent, DeleteComponent, HierarchyId, HierarchyView,
    ImportInfo, MoveComponent, Mutation, MutationOutput, UndoRedoMetadata, UpdateAttribute,
    UpdateTextValue,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn ok<T>(data: T) -> Reply<T> {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }),
    )
}

fn fail<T>(status: StatusCode, message: String) -> Reply<T> {
    tracing::error!(status = status.as_u16(), error = %message, "Request failed");
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }),
    )
}

fn respond<T>(result: Result<T, StateError>) -> Reply<T> {
    match result {
        Ok(data) => ok(data),
        Err(e) if e.is_client_error() => fail(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => fail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Unwrap a JSON body or answer 400 in the usual envelope
macro_rules! body {
    ($payload:expr) => {
        match $payload {
            Ok(Json(body)) => body,
            Err(rejection) => {
                return fail(StatusCode::BAD_REQUEST, rejection.body_text());
            }
        }
    };
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyRequest {
    pub source_component_address: String,
    #[serde(default)]
    pub hierarchy_ids: Vec<HierarchyId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRequest {
    pub source_component_address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileImportsRequest {
    pub source_file_address: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/hierarchy", post(hierarchy))
        .route("/api/components", post(components))
        .route("/api/component", post(component))
        .route("/api/fileImports", post(file_imports))
        .route("/api/createComponent", post(create_component))
        .route("/api/addComponent", post(add_component))
        .route("/api/deleteComponent", post(delete_component))
        .route("/api/moveComponent", post(move_component))
        .route("/api/updateTextValue", post(update_text_value))
        .route("/api/updateAttribute", post(update_attribute))
        .route("/api/undo", post(undo))
        .route("/api/redo", post(redo))
        .route("/api/undoRedoMetadata", post(undo_redo_metadata))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the process exits
pub async fn serve(state: SharedState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

// Queries

async fn hierarchy(
    State(state): State<SharedState>,
    payload: Result<Json<HierarchyRequest>, JsonRejection>,
) -> Reply<HierarchyView> {
    let request = body!(payload);
    let view = state
        .read(|editor| editor.hierarchy(&request.source_component_address, &request.hierarchy_ids))
        .await;
    ok(view)
}

async fn components(State(state): State<SharedState>) -> Reply<Vec<ComponentInfo>> {
    ok(state.read(|editor| editor.components()).await)
}

async fn component(
    State(state): State<SharedState>,
    payload: Result<Json<ComponentRequest>, JsonRejection>,
) -> Reply<ComponentInfo> {
    let request = body!(payload);
    let result = state
        .read(|editor| editor.component(&request.source_component_address))
        .await;
    respond(result.map_err(StateError::from))
}

async fn file_imports(
    State(state): State<SharedState>,
    payload: Result<Json<FileImportsRequest>, JsonRejection>,
) -> Reply<Vec<ImportInfo>> {
    let request = body!(payload);
    let result = state
        .read(|editor| editor.file_imports(&request.source_file_address))
        .await;
    respond(result.map_err(StateError::from))
}

async fn undo_redo_metadata(State(state): State<SharedState>) -> Reply<UndoRedoMetadata> {
    ok(state.read(|editor| editor.undo_redo_metadata()).await)
}

// Mutations

async fn apply(state: &SharedState, mutation: Mutation) -> Reply<MutationOutput> {
    tracing::debug!(mutation = mutation.name(), "Applying mutation");
    respond(state.write(move |editor| editor.apply(mutation)).await)
}

async fn create_component(
    State(state): State<SharedState>,
    payload: Result<Json<CreateComponent>, JsonRejection>,
) -> Reply<MutationOutput> {
    let request = body!(payload);
    apply(&state, Mutation::CreateComponent(request)).await
}

async fn add_component(
    State(state): State<SharedState>,
    payload: Result<Json<AddComponent>, JsonRejection>,
) -> Reply<MutationOutput> {
    let request = body!(payload);
    apply(&state, Mutation::AddComponent(request)).await
}

async fn delete_component(
    State(state): State<SharedState>,
    payload: Result<Json<DeleteComponent>, JsonRejection>,
) -> Reply<MutationOutput> {
    let request = body!(payload);
    apply(&state, Mutation::DeleteComponent(request)).await
}

async fn move_component(
    State(state): State<SharedState>,
    payload: Result<Json<MoveComponent>, JsonRejection>,
) -> Reply<MutationOutput> {
    let request = body!(payload);
    apply(&state, Mutation::MoveComponent(request)).await
}

async fn update_text_value(
    State(state): State<SharedState>,
    payload: Result<Json<UpdateTextValue>, JsonRejection>,
) -> Reply<MutationOutput> {
    let request = body!(payload);
    apply(&state, Mutation::UpdateTextValue(request)).await
}

async fn update_attribute(
    State(state): State<SharedState>,
    payload: Result<Json<UpdateAttribute>, JsonRejection>,
) -> Reply<MutationOutput> {
    let request = body!(payload);
    apply(&state, Mutation::UpdateAttribute(request)).await
}

async fn undo(State(state): State<SharedState>) -> Reply<bool> {
    respond(state.write(|editor| editor.undo()).await)
}

async fn redo(State(state): State<SharedState>) -> Reply<bool> {
    respond(state.write(|editor| editor.redo()).await)
}
