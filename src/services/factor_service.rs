use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::Deserialize;

use super::level_queries::{
    delete_in_container, find_in_container, next_display_order, parent_in_container, reorder,
};
use super::pagination::{list_level, ListQuery, Page};
use super::{ensure_container, ValidationService};
use crate::common::serde_helpers::deserialize_some;
use crate::database::entities::{categories, factors, topics};
use crate::errors::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFactor {
    pub category_id: Option<i32>,
    pub topic_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFactor {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub category_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub topic_id: Option<Option<i32>>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    pub display_order: Option<i32>,
}

#[derive(Clone)]
pub struct FactorService {
    db: DatabaseConnection,
}

impl FactorService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, container_id: i32, query: &ListQuery) -> CoreResult<Page<factors::Model>> {
        ensure_container(&self.db, container_id).await?;
        list_level::<factors::Entity, _>(&self.db, container_id, query)
            .await
            .map_err(|e| CoreError::from_db("list factors", e))
    }

    pub async fn get(&self, container_id: i32, id: i32) -> CoreResult<factors::Model> {
        find_in_container::<factors::Entity, _>(&self.db, container_id, id).await
    }

    /// Create a factor. When only a topic is given, the factor takes the
    /// topic's category.
    pub async fn create(&self, container_id: i32, input: CreateFactor) -> CoreResult<factors::Model> {
        ensure_container(&self.db, container_id).await?;

        let name = ValidationService::validate_name("name", &input.name)?;
        let description = ValidationService::validate_text("description", input.description)?;
        let (category_id, topic_id) = self
            .check_parents(container_id, input.category_id, input.topic_id, true)
            .await?;
        let display_order = match input.display_order {
            Some(order) => ValidationService::validate_display_order(order)?,
            None => next_display_order::<factors::Entity, _>(&self.db, container_id).await?,
        };

        let now = Utc::now();
        let factor = factors::ActiveModel {
            container_id: Set(container_id),
            category_id: Set(category_id),
            topic_id: Set(topic_id),
            name: Set(name),
            description: Set(description),
            display_order: Set(display_order),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        factor
            .insert(&self.db)
            .await
            .map_err(|e| CoreError::from_db("create factor", e))
    }

    pub async fn update(&self, container_id: i32, id: i32, patch: UpdateFactor) -> CoreResult<factors::Model> {
        let existing = self.get(container_id, id).await?;

        let requested_category = patch.category_id.unwrap_or(existing.category_id);
        let requested_topic = patch.topic_id.unwrap_or(existing.topic_id);
        let (category_id, topic_id) = self
            .check_parents(container_id, requested_category, requested_topic, false)
            .await?;

        let mut factor: factors::ActiveModel = existing.into();
        factor.category_id = Set(category_id);
        factor.topic_id = Set(topic_id);

        if let Some(name) = patch.name {
            factor.name = Set(ValidationService::validate_name("name", &name)?);
        }
        if let Some(description) = patch.description {
            factor.description = Set(ValidationService::validate_text("description", description)?);
        }
        if let Some(order) = patch.display_order {
            factor.display_order = Set(ValidationService::validate_display_order(order)?);
        }
        factor.updated_at = Set(Utc::now());

        factor
            .update(&self.db)
            .await
            .map_err(|e| CoreError::from_db("update factor", e))
    }

    pub async fn delete(&self, container_id: i32, id: i32) -> CoreResult<()> {
        delete_in_container::<factors::Entity, _>(&self.db, container_id, id).await
    }

    pub async fn reorder(&self, container_id: i32, ordered_ids: &[i32]) -> CoreResult<()> {
        ensure_container(&self.db, container_id).await?;
        reorder::<factors::Entity>(&self.db, container_id, ordered_ids).await
    }

    /// Both parents must live in the container, and a topic that belongs to
    /// a category pins the factor to that category.
    async fn check_parents(
        &self,
        container_id: i32,
        category_id: Option<i32>,
        topic_id: Option<i32>,
        inherit_category: bool,
    ) -> CoreResult<(Option<i32>, Option<i32>)> {
        let category =
            parent_in_container::<categories::Entity, _>(&self.db, container_id, "category_id", category_id)
                .await?;
        let topic =
            parent_in_container::<topics::Entity, _>(&self.db, container_id, "topic_id", topic_id).await?;

        let category_id = category.map(|category| category.id);
        let topic_category = topic.as_ref().and_then(|topic| topic.category_id);

        let category_id = match (category_id, topic_category) {
            (Some(given), Some(expected)) if given != expected => {
                return Err(CoreError::invalid_field(
                    "category_id",
                    format!(
                        "category {} does not match category {} of topic {}",
                        given,
                        expected,
                        topic.map(|topic| topic.id).unwrap_or_default()
                    ),
                ));
            }
            (None, Some(expected)) if inherit_category => Some(expected),
            (given, _) => given,
        };

        Ok((category_id, topic.map(|topic| topic.id)))
    }
}
