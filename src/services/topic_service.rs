use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::Deserialize;

use super::level_queries::{
    delete_in_container, find_in_container, next_display_order, parent_in_container, reorder,
};
use super::pagination::{list_level, ListQuery, Page};
use super::{ensure_container, ValidationService};
use crate::common::serde_helpers::deserialize_some;
use crate::database::entities::{categories, topics};
use crate::errors::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTopic {
    pub category_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTopic {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub category_id: Option<Option<i32>>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    pub display_order: Option<i32>,
}

#[derive(Clone)]
pub struct TopicService {
    db: DatabaseConnection,
}

impl TopicService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, container_id: i32, query: &ListQuery) -> CoreResult<Page<topics::Model>> {
        ensure_container(&self.db, container_id).await?;
        list_level::<topics::Entity, _>(&self.db, container_id, query)
            .await
            .map_err(|e| CoreError::from_db("list topics", e))
    }

    pub async fn get(&self, container_id: i32, id: i32) -> CoreResult<topics::Model> {
        find_in_container::<topics::Entity, _>(&self.db, container_id, id).await
    }

    pub async fn create(&self, container_id: i32, input: CreateTopic) -> CoreResult<topics::Model> {
        ensure_container(&self.db, container_id).await?;

        let name = ValidationService::validate_name("name", &input.name)?;
        let description = ValidationService::validate_text("description", input.description)?;
        let category_id = self.check_category(container_id, input.category_id).await?;
        let display_order = match input.display_order {
            Some(order) => ValidationService::validate_display_order(order)?,
            None => next_display_order::<topics::Entity, _>(&self.db, container_id).await?,
        };

        let now = Utc::now();
        let topic = topics::ActiveModel {
            container_id: Set(container_id),
            category_id: Set(category_id),
            name: Set(name),
            description: Set(description),
            display_order: Set(display_order),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        topic
            .insert(&self.db)
            .await
            .map_err(|e| CoreError::from_db("create topic", e))
    }

    pub async fn update(&self, container_id: i32, id: i32, patch: UpdateTopic) -> CoreResult<topics::Model> {
        let existing = self.get(container_id, id).await?;
        let mut topic: topics::ActiveModel = existing.into();

        if let Some(category_id) = patch.category_id {
            topic.category_id = Set(self.check_category(container_id, category_id).await?);
        }
        if let Some(name) = patch.name {
            topic.name = Set(ValidationService::validate_name("name", &name)?);
        }
        if let Some(description) = patch.description {
            topic.description = Set(ValidationService::validate_text("description", description)?);
        }
        if let Some(order) = patch.display_order {
            topic.display_order = Set(ValidationService::validate_display_order(order)?);
        }
        topic.updated_at = Set(Utc::now());

        topic
            .update(&self.db)
            .await
            .map_err(|e| CoreError::from_db("update topic", e))
    }

    pub async fn delete(&self, container_id: i32, id: i32) -> CoreResult<()> {
        delete_in_container::<topics::Entity, _>(&self.db, container_id, id).await
    }

    pub async fn reorder(&self, container_id: i32, ordered_ids: &[i32]) -> CoreResult<()> {
        ensure_container(&self.db, container_id).await?;
        reorder::<topics::Entity>(&self.db, container_id, ordered_ids).await
    }

    async fn check_category(&self, container_id: i32, category_id: Option<i32>) -> CoreResult<Option<i32>> {
        let category =
            parent_in_container::<categories::Entity, _>(&self.db, container_id, "category_id", category_id)
                .await?;
        Ok(category.map(|category| category.id))
    }
}
