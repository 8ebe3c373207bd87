use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use tracing::info;

use crate::cloning::{CloneSummary, StructureCloner};
use crate::errors::CoreError;
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneRequest {
    pub source_container_id: i32,
    pub destination_container_id: i32,
}

pub async fn clone_structure(
    State(state): State<AppState>,
    Json(payload): Json<CloneRequest>,
) -> Result<(StatusCode, Json<CloneSummary>), CoreError> {
    info!(
        "Clone requested from container {} into container {}",
        payload.source_container_id, payload.destination_container_id
    );

    let cloner = StructureCloner::new(state.db.clone());
    let summary = cloner
        .clone_structure(payload.source_container_id, payload.destination_container_id)
        .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}
