use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use super::ReorderRequest;
use crate::database::entities::contents;
use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::services::{ContentService, CreateContent, ListQuery, Page, UpdateContent};

pub async fn list_contents(
    State(state): State<AppState>,
    Path(container_id): Path<i32>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<contents::Model>>, CoreError> {
    let service = ContentService::new(state.db.clone());
    Ok(Json(service.list(container_id, &query).await?))
}

pub async fn create_content(
    State(state): State<AppState>,
    Path(container_id): Path<i32>,
    Json(payload): Json<CreateContent>,
) -> Result<(StatusCode, Json<contents::Model>), CoreError> {
    let service = ContentService::new(state.db.clone());
    let created = service.create(container_id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_content(
    State(state): State<AppState>,
    Path((container_id, id)): Path<(i32, i32)>,
) -> Result<Json<contents::Model>, CoreError> {
    let service = ContentService::new(state.db.clone());
    Ok(Json(service.get(container_id, id).await?))
}

pub async fn update_content(
    State(state): State<AppState>,
    Path((container_id, id)): Path<(i32, i32)>,
    Json(payload): Json<UpdateContent>,
) -> Result<Json<contents::Model>, CoreError> {
    let service = ContentService::new(state.db.clone());
    Ok(Json(service.update(container_id, id, payload).await?))
}

pub async fn delete_content(
    State(state): State<AppState>,
    Path((container_id, id)): Path<(i32, i32)>,
) -> Result<StatusCode, CoreError> {
    let service = ContentService::new(state.db.clone());
    service.delete(container_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_contents(
    State(state): State<AppState>,
    Path(container_id): Path<i32>,
    Json(payload): Json<ReorderRequest>,
) -> Result<StatusCode, CoreError> {
    let service = ContentService::new(state.db.clone());
    service.reorder(container_id, &payload.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}
