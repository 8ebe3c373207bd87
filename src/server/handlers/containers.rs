use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::database::entities::{containers, ContainerKind};
use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::services::{
    ContainerService, CreateAssessment, CreateTemplate, CreatedContainer, ListQuery, Page,
    UpdateContainer,
};

#[derive(Debug, Default, Deserialize)]
pub struct ContainerListQuery {
    pub kind: Option<String>,
    pub page: Option<u64>,
    #[serde(alias = "perPage")]
    pub per_page: Option<u64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CreateContainerRequest {
    Template(CreateTemplate),
    Assessment(CreateAssessment),
}

#[derive(Debug, Deserialize)]
pub struct DuplicateContainerRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct InstantiateTemplateRequest {
    pub company_name: String,
    pub assessment_year: i32,
    pub name: Option<String>,
}

pub async fn list_containers(
    State(state): State<AppState>,
    Query(params): Query<ContainerListQuery>,
) -> Result<Json<Page<containers::Model>>, CoreError> {
    let kind = params
        .kind
        .as_deref()
        .map(|value| value.parse::<ContainerKind>())
        .transpose()
        .map_err(|e| CoreError::invalid_field("kind", e))?;
    let query = ListQuery {
        page: params.page,
        per_page: params.per_page,
        search: params.search,
    };

    let service = ContainerService::new(state.db.clone());
    Ok(Json(service.list(kind, &query).await?))
}

pub async fn create_container(
    State(state): State<AppState>,
    Json(payload): Json<CreateContainerRequest>,
) -> Result<(StatusCode, Json<CreatedContainer>), CoreError> {
    let service = ContainerService::new(state.db.clone());
    let created = match payload {
        CreateContainerRequest::Template(input) => CreatedContainer {
            container: service.create_template(input).await?,
            clone: None,
        },
        CreateContainerRequest::Assessment(input) => service.create_assessment(input).await?,
    };

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_container(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<containers::Model>, CoreError> {
    let service = ContainerService::new(state.db.clone());
    Ok(Json(service.get(id).await?))
}

pub async fn update_container(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateContainer>,
) -> Result<Json<containers::Model>, CoreError> {
    let service = ContainerService::new(state.db.clone());
    Ok(Json(service.update(id, payload).await?))
}

pub async fn delete_container(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, CoreError> {
    let service = ContainerService::new(state.db.clone());
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn duplicate_container(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<DuplicateContainerRequest>,
) -> Result<(StatusCode, Json<CreatedContainer>), CoreError> {
    let service = ContainerService::new(state.db.clone());
    let created = service.duplicate(id, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn create_assessment_from_template(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<InstantiateTemplateRequest>,
) -> Result<(StatusCode, Json<CreatedContainer>), CoreError> {
    let service = ContainerService::new(state.db.clone());
    let created = service
        .create_assessment(CreateAssessment {
            company_name: payload.company_name,
            assessment_year: payload.assessment_year,
            name: payload.name,
            template_id: Some(id),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}
