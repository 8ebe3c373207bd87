use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::Deserialize;

use super::level_queries::{delete_in_container, find_in_container, next_display_order, reorder};
use super::pagination::{list_level, ListQuery, Page};
use super::{ensure_container, ValidationService};
use crate::common::serde_helpers::deserialize_some;
use crate::database::entities::categories;
use crate::errors::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    pub display_order: Option<i32>,
}

#[derive(Clone)]
pub struct CategoryService {
    db: DatabaseConnection,
}

impl CategoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        container_id: i32,
        query: &ListQuery,
    ) -> CoreResult<Page<categories::Model>> {
        ensure_container(&self.db, container_id).await?;
        list_level::<categories::Entity, _>(&self.db, container_id, query)
            .await
            .map_err(|e| CoreError::from_db("list categories", e))
    }

    pub async fn get(&self, container_id: i32, id: i32) -> CoreResult<categories::Model> {
        find_in_container::<categories::Entity, _>(&self.db, container_id, id).await
    }

    pub async fn create(
        &self,
        container_id: i32,
        input: CreateCategory,
    ) -> CoreResult<categories::Model> {
        ensure_container(&self.db, container_id).await?;

        let name = ValidationService::validate_name("name", &input.name)?;
        let description = ValidationService::validate_text("description", input.description)?;
        let display_order = match input.display_order {
            Some(order) => ValidationService::validate_display_order(order)?,
            None => next_display_order::<categories::Entity, _>(&self.db, container_id).await?,
        };

        let now = Utc::now();
        let category = categories::ActiveModel {
            container_id: Set(container_id),
            name: Set(name),
            description: Set(description),
            display_order: Set(display_order),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        category
            .insert(&self.db)
            .await
            .map_err(|e| CoreError::from_db("create category", e))
    }

    pub async fn update(
        &self,
        container_id: i32,
        id: i32,
        patch: UpdateCategory,
    ) -> CoreResult<categories::Model> {
        let existing = self.get(container_id, id).await?;
        let mut category: categories::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            category.name = Set(ValidationService::validate_name("name", &name)?);
        }
        if let Some(description) = patch.description {
            category.description = Set(ValidationService::validate_text(
                "description",
                description,
            )?);
        }
        if let Some(order) = patch.display_order {
            category.display_order = Set(ValidationService::validate_display_order(order)?);
        }
        category.updated_at = Set(Utc::now());

        category
            .update(&self.db)
            .await
            .map_err(|e| CoreError::from_db("update category", e))
    }

    /// Deleting a category removes its contents and detaches its topics
    /// and factors.
    pub async fn delete(&self, container_id: i32, id: i32) -> CoreResult<()> {
        delete_in_container::<categories::Entity, _>(&self.db, container_id, id).await
    }

    pub async fn reorder(&self, container_id: i32, ordered_ids: &[i32]) -> CoreResult<()> {
        ensure_container(&self.db, container_id).await?;
        reorder::<categories::Entity>(&self.db, container_id, ordered_ids).await
    }
}
