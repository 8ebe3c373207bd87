use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json},
};

use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::services::{StructureImportResult, StructureSpreadsheetService};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub async fn export_structure(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, CoreError> {
    let service = StructureSpreadsheetService::new(state.db.clone());
    let bytes = service.export_to_xlsx(id).await?;

    let disposition = format!("attachment; filename=\"container-{}-structure.xlsx\"", id);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

pub async fn import_structure(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Bytes,
) -> Result<Json<StructureImportResult>, CoreError> {
    if body.is_empty() {
        return Err(CoreError::invalid_field("body", "Spreadsheet upload is empty"));
    }

    let service = StructureSpreadsheetService::new(state.db.clone());
    let result = service.import_from_xlsx(id, &body).await?;
    Ok(Json(result))
}
