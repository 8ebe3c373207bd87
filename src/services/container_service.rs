use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::pagination::{name_contains, paginate, ListQuery, Page};
use super::ValidationService;
use crate::cloning::{CloneSummary, StructureCloner};
use crate::common::serde_helpers::deserialize_some;
use crate::database::entities::{containers, ContainerKind};
use crate::errors::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssessment {
    pub company_name: String,
    pub assessment_year: i32,
    pub name: Option<String>,
    /// Template whose structure is copied into the new assessment
    pub template_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContainer {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    pub company_name: Option<String>,
    pub assessment_year: Option<i32>,
    pub is_active: Option<bool>,
}

/// A newly created container and, when its structure was copied from
/// another container, the clone summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedContainer {
    pub container: containers::Model,
    pub clone: Option<CloneSummary>,
}

#[derive(Clone)]
pub struct ContainerService {
    db: DatabaseConnection,
}

impl ContainerService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        kind: Option<ContainerKind>,
        query: &ListQuery,
    ) -> CoreResult<Page<containers::Model>> {
        let mut select = containers::Entity::find();
        if let Some(kind) = kind {
            select = select.filter(containers::Column::Kind.eq(kind.as_str()));
        }
        if let Some(term) = query.search_term() {
            select = select.filter(Expr::col(containers::Column::Name).like(name_contains(term)));
        }
        let select = select
            .order_by_desc(containers::Column::CreatedAt)
            .order_by_desc(containers::Column::Id);

        paginate(&self.db, select, query)
            .await
            .map_err(|e| CoreError::from_db("list containers", e))
    }

    pub async fn get(&self, id: i32) -> CoreResult<containers::Model> {
        containers::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| CoreError::from_db("load container", e))?
            .ok_or_else(|| CoreError::not_found("container", id.to_string()))
    }

    pub async fn create_template(&self, input: CreateTemplate) -> CoreResult<containers::Model> {
        let name = ValidationService::validate_name("name", &input.name)?;
        let description = ValidationService::validate_text("description", input.description)?;

        let template = self
            .insert_container(ContainerKind::Template, name, description, None, None, None)
            .await?;
        info!("Created template {} '{}'", template.id, template.name);
        Ok(template)
    }

    /// Create an assessment, copying the structure of `template_id` when
    /// one is given.
    pub async fn create_assessment(&self, input: CreateAssessment) -> CoreResult<CreatedContainer> {
        let company_name = ValidationService::validate_name("company_name", &input.company_name)?;
        let year = ValidationService::validate_assessment_year(input.assessment_year)?;
        let name = match input.name {
            Some(name) => ValidationService::validate_name("name", &name)?,
            None => format!("{} {}", company_name, year),
        };

        if let Some(template_id) = input.template_id {
            let template = self.get(template_id).await?;
            if !template.is_template() {
                return Err(CoreError::invalid_field(
                    "template_id",
                    format!("container {} is not a template", template_id),
                ));
            }
        }

        let assessment = self
            .insert_container(
                ContainerKind::Assessment,
                name,
                None,
                Some(company_name),
                Some(year),
                input.template_id,
            )
            .await?;
        info!(
            "Created assessment {} for '{}' ({})",
            assessment.id,
            assessment.company_name.as_deref().unwrap_or_default(),
            year
        );

        self.populate(assessment, input.template_id).await
    }

    pub async fn update(&self, id: i32, patch: UpdateContainer) -> CoreResult<containers::Model> {
        let existing = self.get(id).await?;
        let is_assessment = !existing.is_template();
        let mut container: containers::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            container.name = Set(ValidationService::validate_name("name", &name)?);
        }
        if let Some(description) = patch.description {
            container.description = Set(ValidationService::validate_text("description", description)?);
        }
        if patch.company_name.is_some() || patch.assessment_year.is_some() {
            if !is_assessment {
                return Err(CoreError::validation(
                    "company_name and assessment_year only apply to assessments",
                ));
            }
            if let Some(company_name) = patch.company_name {
                container.company_name =
                    Set(Some(ValidationService::validate_name("company_name", &company_name)?));
            }
            if let Some(year) = patch.assessment_year {
                container.assessment_year =
                    Set(Some(ValidationService::validate_assessment_year(year)?));
            }
        }
        if let Some(is_active) = patch.is_active {
            container.is_active = Set(is_active);
        }
        container.updated_at = Set(Utc::now());

        container
            .update(&self.db)
            .await
            .map_err(|e| CoreError::from_db("update container", e))
    }

    /// Delete a container together with its whole structure.
    pub async fn delete(&self, id: i32) -> CoreResult<()> {
        let result = containers::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| CoreError::from_db("delete container", e))?;

        if result.rows_affected == 0 {
            return Err(CoreError::not_found("container", id.to_string()));
        }

        info!("Deleted container {}", id);
        Ok(())
    }

    /// New container of the same kind holding a copy of the structure.
    pub async fn duplicate(&self, id: i32, name: &str) -> CoreResult<CreatedContainer> {
        let source = self.get(id).await?;
        let name = ValidationService::validate_name("name", name)?;
        let kind = source.container_kind().unwrap_or(ContainerKind::Template);

        let copy = self
            .insert_container(
                kind,
                name,
                source.description.clone(),
                source.company_name.clone(),
                source.assessment_year,
                Some(source.id),
            )
            .await?;

        self.populate(copy, Some(source.id)).await
    }

    /// Clone `source_id` into a freshly created container. A failed clone
    /// deletes the new container again.
    async fn populate(
        &self,
        container: containers::Model,
        source_id: Option<i32>,
    ) -> CoreResult<CreatedContainer> {
        let Some(source_id) = source_id else {
            return Ok(CreatedContainer {
                container,
                clone: None,
            });
        };

        let cloner = StructureCloner::new(self.db.clone());
        match cloner.clone_structure(source_id, container.id).await {
            Ok(summary) => Ok(CreatedContainer {
                container,
                clone: Some(summary),
            }),
            Err(err) => {
                warn!(
                    "Removing container {} after failed clone from {}",
                    container.id, source_id
                );
                if let Err(cleanup) = containers::Entity::delete_by_id(container.id)
                    .exec(&self.db)
                    .await
                {
                    warn!("Failed to remove container {}: {}", container.id, cleanup);
                }
                Err(err.into())
            }
        }
    }

    async fn insert_container(
        &self,
        kind: ContainerKind,
        name: String,
        description: Option<String>,
        company_name: Option<String>,
        assessment_year: Option<i32>,
        source_container_id: Option<i32>,
    ) -> CoreResult<containers::Model> {
        let now = Utc::now();
        let container = containers::ActiveModel {
            kind: Set(kind.as_str().to_string()),
            name: Set(name),
            description: Set(description),
            company_name: Set(company_name),
            assessment_year: Set(assessment_year),
            source_container_id: Set(source_container_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        container
            .insert(&self.db)
            .await
            .map_err(|e| CoreError::from_db("create container", e))
    }
}
