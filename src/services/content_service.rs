use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, Set};
use serde::Deserialize;
use serde_json::Value;

use super::level_queries::{
    delete_in_container, find_in_container, next_display_order, parent_in_container, reorder,
};
use super::pagination::{list_level, ListQuery, Page};
use super::{ensure_container, ValidationService};
use crate::common::serde_helpers::deserialize_some;
use crate::database::entities::{categories, contents, factors, topics};
use crate::errors::{CoreError, CoreResult};

pub const DEFAULT_ANSWER_TYPE: &str = "text";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateContent {
    pub category_id: i32,
    pub topic_id: Option<i32>,
    pub factor_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub question: Option<String>,
    pub answer_type: Option<String>,
    pub answer_options: Option<Value>,
    pub placeholder: Option<String>,
    pub info_question: Option<String>,
    pub info_answer: Option<String>,
    pub guidance: Option<String>,
    pub is_required: Option<bool>,
    pub weight: Option<i32>,
    pub likelihood_scale: Option<String>,
    pub impact_scale: Option<String>,
    pub control_rating: Option<String>,
    pub mitigation_hint: Option<String>,
    pub evidence_hint: Option<String>,
    pub reference_code: Option<String>,
    pub owner_role: Option<String>,
    pub review_frequency: Option<String>,
    pub notes: Option<String>,
    pub display_order: Option<i32>,
}

/// Partial update. Nullable fields use `Some(None)` for an explicit null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContent {
    pub category_id: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub topic_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub factor_id: Option<Option<i32>>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub question: Option<Option<String>>,
    pub answer_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub answer_options: Option<Option<Value>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub placeholder: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub info_question: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub info_answer: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub guidance: Option<Option<String>>,
    pub is_required: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub weight: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub likelihood_scale: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub impact_scale: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub control_rating: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub mitigation_hint: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub evidence_hint: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub reference_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub owner_role: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub review_frequency: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
    pub display_order: Option<i32>,
}

fn text(field: &str, value: Option<String>) -> CoreResult<ActiveValue<Option<String>>> {
    Ok(Set(ValidationService::validate_text(field, value)?))
}

fn patch_text(
    target: &mut ActiveValue<Option<String>>,
    field: &str,
    value: Option<Option<String>>,
) -> CoreResult<()> {
    if let Some(value) = value {
        *target = text(field, value)?;
    }
    Ok(())
}

fn answer_options(options: Option<Value>) -> CoreResult<Option<String>> {
    match options {
        None | Some(Value::Null) => Ok(None),
        Some(options) => ValidationService::validate_answer_options(&options).map(Some),
    }
}

#[derive(Clone)]
pub struct ContentService {
    db: DatabaseConnection,
}

impl ContentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, container_id: i32, query: &ListQuery) -> CoreResult<Page<contents::Model>> {
        ensure_container(&self.db, container_id).await?;
        list_level::<contents::Entity, _>(&self.db, container_id, query)
            .await
            .map_err(|e| CoreError::from_db("list contents", e))
    }

    pub async fn get(&self, container_id: i32, id: i32) -> CoreResult<contents::Model> {
        find_in_container::<contents::Entity, _>(&self.db, container_id, id).await
    }

    pub async fn create(&self, container_id: i32, input: CreateContent) -> CoreResult<contents::Model> {
        ensure_container(&self.db, container_id).await?;

        let name = ValidationService::validate_name("name", &input.name)?;
        let answer_type = ValidationService::validate_answer_type(
            input.answer_type.as_deref().unwrap_or(DEFAULT_ANSWER_TYPE),
        )?;
        let (category_id, topic_id, factor_id) = self
            .check_parents(container_id, input.category_id, input.topic_id, input.factor_id)
            .await?;
        let display_order = match input.display_order {
            Some(order) => ValidationService::validate_display_order(order)?,
            None => next_display_order::<contents::Entity, _>(&self.db, container_id).await?,
        };

        let now = Utc::now();
        let content = contents::ActiveModel {
            container_id: Set(container_id),
            category_id: Set(category_id),
            topic_id: Set(topic_id),
            factor_id: Set(factor_id),
            name: Set(name),
            description: text("description", input.description)?,
            question: text("question", input.question)?,
            answer_type: Set(answer_type),
            answer_options: Set(answer_options(input.answer_options)?),
            placeholder: text("placeholder", input.placeholder)?,
            info_question: text("info_question", input.info_question)?,
            info_answer: text("info_answer", input.info_answer)?,
            guidance: text("guidance", input.guidance)?,
            is_required: Set(input.is_required.unwrap_or(false)),
            weight: Set(input.weight),
            likelihood_scale: text("likelihood_scale", input.likelihood_scale)?,
            impact_scale: text("impact_scale", input.impact_scale)?,
            control_rating: text("control_rating", input.control_rating)?,
            mitigation_hint: text("mitigation_hint", input.mitigation_hint)?,
            evidence_hint: text("evidence_hint", input.evidence_hint)?,
            reference_code: text("reference_code", input.reference_code)?,
            owner_role: text("owner_role", input.owner_role)?,
            review_frequency: text("review_frequency", input.review_frequency)?,
            notes: text("notes", input.notes)?,
            display_order: Set(display_order),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        content
            .insert(&self.db)
            .await
            .map_err(|e| CoreError::from_db("create content", e))
    }

    pub async fn update(&self, container_id: i32, id: i32, patch: UpdateContent) -> CoreResult<contents::Model> {
        let existing = self.get(container_id, id).await?;

        let (category_id, topic_id, factor_id) = self
            .check_parents(
                container_id,
                patch.category_id.unwrap_or(existing.category_id),
                patch.topic_id.unwrap_or(existing.topic_id),
                patch.factor_id.unwrap_or(existing.factor_id),
            )
            .await?;

        let mut content: contents::ActiveModel = existing.into();
        content.category_id = Set(category_id);
        content.topic_id = Set(topic_id);
        content.factor_id = Set(factor_id);

        if let Some(name) = patch.name {
            content.name = Set(ValidationService::validate_name("name", &name)?);
        }
        if let Some(answer_type) = patch.answer_type {
            content.answer_type = Set(ValidationService::validate_answer_type(&answer_type)?);
        }
        if let Some(options) = patch.answer_options {
            content.answer_options = Set(answer_options(options)?);
        }
        if let Some(is_required) = patch.is_required {
            content.is_required = Set(is_required);
        }
        if let Some(weight) = patch.weight {
            content.weight = Set(weight);
        }
        if let Some(order) = patch.display_order {
            content.display_order = Set(ValidationService::validate_display_order(order)?);
        }

        patch_text(&mut content.description, "description", patch.description)?;
        patch_text(&mut content.question, "question", patch.question)?;
        patch_text(&mut content.placeholder, "placeholder", patch.placeholder)?;
        patch_text(&mut content.info_question, "info_question", patch.info_question)?;
        patch_text(&mut content.info_answer, "info_answer", patch.info_answer)?;
        patch_text(&mut content.guidance, "guidance", patch.guidance)?;
        patch_text(&mut content.likelihood_scale, "likelihood_scale", patch.likelihood_scale)?;
        patch_text(&mut content.impact_scale, "impact_scale", patch.impact_scale)?;
        patch_text(&mut content.control_rating, "control_rating", patch.control_rating)?;
        patch_text(&mut content.mitigation_hint, "mitigation_hint", patch.mitigation_hint)?;
        patch_text(&mut content.evidence_hint, "evidence_hint", patch.evidence_hint)?;
        patch_text(&mut content.reference_code, "reference_code", patch.reference_code)?;
        patch_text(&mut content.owner_role, "owner_role", patch.owner_role)?;
        patch_text(&mut content.review_frequency, "review_frequency", patch.review_frequency)?;
        patch_text(&mut content.notes, "notes", patch.notes)?;

        content.updated_at = Set(Utc::now());

        content
            .update(&self.db)
            .await
            .map_err(|e| CoreError::from_db("update content", e))
    }

    pub async fn delete(&self, container_id: i32, id: i32) -> CoreResult<()> {
        delete_in_container::<contents::Entity, _>(&self.db, container_id, id).await
    }

    pub async fn reorder(&self, container_id: i32, ordered_ids: &[i32]) -> CoreResult<()> {
        ensure_container(&self.db, container_id).await?;
        reorder::<contents::Entity>(&self.db, container_id, ordered_ids).await
    }

    /// Category is required; topic and factor are optional. When a factor
    /// is given, its own topic and category must agree with the others.
    async fn check_parents(
        &self,
        container_id: i32,
        category_id: i32,
        topic_id: Option<i32>,
        factor_id: Option<i32>,
    ) -> CoreResult<(i32, Option<i32>, Option<i32>)> {
        parent_in_container::<categories::Entity, _>(&self.db, container_id, "category_id", Some(category_id))
            .await?;
        let topic =
            parent_in_container::<topics::Entity, _>(&self.db, container_id, "topic_id", topic_id).await?;
        let factor =
            parent_in_container::<factors::Entity, _>(&self.db, container_id, "factor_id", factor_id).await?;

        if let Some(factor) = &factor {
            if let (Some(expected), Some(topic)) = (factor.topic_id, &topic) {
                if expected != topic.id {
                    return Err(CoreError::invalid_field(
                        "topic_id",
                        format!("factor {} belongs to topic {}, not {}", factor.id, expected, topic.id),
                    ));
                }
            }
            if let Some(expected) = factor.category_id {
                if expected != category_id {
                    return Err(CoreError::invalid_field(
                        "category_id",
                        format!(
                            "factor {} belongs to category {}, not {}",
                            factor.id, expected, category_id
                        ),
                    ));
                }
            }
        }

        Ok((category_id, topic.map(|t| t.id), factor.map(|f| f.id)))
    }
}
