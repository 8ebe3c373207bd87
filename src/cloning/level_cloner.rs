use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveValue::NotSet, ConnectionTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::remapper::{IdentityRemapper, ParentRef};
use crate::database::entities::{categories, contents, factors, topics, Level, LevelEntity};
use crate::errors::CloneError;

/// A content row left out of the destination tree because its category
/// did not map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedContent {
    pub source_id: i32,
    pub reason: String,
}

/// An optional content reference cleared because it did not map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachedReference {
    pub source_id: i32,
    pub field: String,
    pub missing_id: i32,
}

/// What to do with one source row.
pub enum RowPlan<A> {
    Insert {
        row: A,
        detached: Vec<DetachedReference>,
    },
    Drop(DroppedContent),
}

impl<A> RowPlan<A> {
    fn insert(row: A) -> Self {
        RowPlan::Insert {
            row,
            detached: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct LevelOutcome {
    pub cloned: usize,
    pub dropped: Vec<DroppedContent>,
    pub detached: Vec<DetachedReference>,
}

/// Field copy and reference rules for one level.
pub trait LevelCloner {
    type Entity: LevelEntity;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send;

    /// Leaf levels are never referenced, so their ids are not recorded.
    const RECORDS_MAPPING: bool = true;

    fn row_id(model: &<Self::Entity as EntityTrait>::Model) -> i32;

    /// Build the destination row for `source`, with every reference remapped.
    fn plan(
        source: &<Self::Entity as EntityTrait>::Model,
        destination_id: i32,
        remapper: &IdentityRemapper,
        now: ChronoDateTimeUtc,
    ) -> Result<RowPlan<Self::ActiveModel>, CloneError>;
}

/// Copy every row of one level from `source_id` into `destination_id`.
///
/// Rows are read in display order and inserted one by one; the level is
/// sealed in the remapper once the last row is in.
pub async fn clone_level<L, C>(
    conn: &C,
    source_id: i32,
    destination_id: i32,
    remapper: &mut IdentityRemapper,
    now: ChronoDateTimeUtc,
) -> Result<LevelOutcome, CloneError>
where
    L: LevelCloner,
    C: ConnectionTrait,
    <L::Entity as EntityTrait>::Model: IntoActiveModel<L::ActiveModel>,
{
    let level = <L::Entity as LevelEntity>::LEVEL;

    let rows = L::Entity::find()
        .filter(<L::Entity as LevelEntity>::container_column().eq(source_id))
        .order_by_asc(<L::Entity as LevelEntity>::order_column())
        .order_by_asc(<L::Entity as LevelEntity>::id_column())
        .all(conn)
        .await?;

    debug!("Cloning {} {} rows from container {}", rows.len(), level, source_id);

    let mut outcome = LevelOutcome::default();

    for source in &rows {
        let row_id = L::row_id(source);

        match L::plan(source, destination_id, remapper, now)? {
            RowPlan::Insert { row, detached } => {
                let inserted = row
                    .insert(conn)
                    .await
                    .map_err(|source| CloneError::RowFailed {
                        level,
                        source_id: row_id,
                        source,
                    })?;

                if L::RECORDS_MAPPING {
                    remapper.record(level, row_id, L::row_id(&inserted))?;
                }

                for reference in &detached {
                    warn!(
                        "Cleared {} on cloned {} {}: id {} was not cloned",
                        reference.field, level, row_id, reference.missing_id
                    );
                }
                outcome.detached.extend(detached);
                outcome.cloned += 1;
            }
            RowPlan::Drop(dropped) => {
                warn!("Skipped {} {}: {}", level, dropped.source_id, dropped.reason);
                outcome.dropped.push(dropped);
            }
        }
    }

    if L::RECORDS_MAPPING {
        remapper.seal(level);
    }

    Ok(outcome)
}

/// Resolve a parent that must map whenever it is set.
fn required_parent(
    remapper: &IdentityRemapper,
    level: Level,
    source_id: i32,
    parent_level: Level,
    parent_id: Option<i32>,
) -> Result<Option<i32>, CloneError> {
    match remapper.remap(parent_level, parent_id)? {
        ParentRef::Absent => Ok(None),
        ParentRef::Resolved(id) => Ok(Some(id)),
        ParentRef::Unresolved(missing) => Err(CloneError::Integrity {
            level,
            source_id,
            detail: format!(
                "{} {} is not part of the source container",
                parent_level, missing
            ),
        }),
    }
}

pub struct CategoryCloner;

impl LevelCloner for CategoryCloner {
    type Entity = categories::Entity;
    type ActiveModel = categories::ActiveModel;

    fn row_id(model: &categories::Model) -> i32 {
        model.id
    }

    fn plan(
        source: &categories::Model,
        destination_id: i32,
        _remapper: &IdentityRemapper,
        now: ChronoDateTimeUtc,
    ) -> Result<RowPlan<categories::ActiveModel>, CloneError> {
        Ok(RowPlan::insert(categories::ActiveModel {
            id: NotSet,
            container_id: Set(destination_id),
            name: Set(source.name.clone()),
            description: Set(source.description.clone()),
            display_order: Set(source.display_order),
            created_at: Set(now),
            updated_at: Set(now),
        }))
    }
}

pub struct TopicCloner;

impl LevelCloner for TopicCloner {
    type Entity = topics::Entity;
    type ActiveModel = topics::ActiveModel;

    fn row_id(model: &topics::Model) -> i32 {
        model.id
    }

    fn plan(
        source: &topics::Model,
        destination_id: i32,
        remapper: &IdentityRemapper,
        now: ChronoDateTimeUtc,
    ) -> Result<RowPlan<topics::ActiveModel>, CloneError> {
        let category_id = required_parent(
            remapper,
            Level::Topic,
            source.id,
            Level::Category,
            source.category_id,
        )?;

        Ok(RowPlan::insert(topics::ActiveModel {
            id: NotSet,
            container_id: Set(destination_id),
            category_id: Set(category_id),
            name: Set(source.name.clone()),
            description: Set(source.description.clone()),
            display_order: Set(source.display_order),
            created_at: Set(now),
            updated_at: Set(now),
        }))
    }
}

pub struct FactorCloner;

impl LevelCloner for FactorCloner {
    type Entity = factors::Entity;
    type ActiveModel = factors::ActiveModel;

    fn row_id(model: &factors::Model) -> i32 {
        model.id
    }

    fn plan(
        source: &factors::Model,
        destination_id: i32,
        remapper: &IdentityRemapper,
        now: ChronoDateTimeUtc,
    ) -> Result<RowPlan<factors::ActiveModel>, CloneError> {
        let category_id = required_parent(
            remapper,
            Level::Factor,
            source.id,
            Level::Category,
            source.category_id,
        )?;
        let topic_id = required_parent(
            remapper,
            Level::Factor,
            source.id,
            Level::Topic,
            source.topic_id,
        )?;

        Ok(RowPlan::insert(factors::ActiveModel {
            id: NotSet,
            container_id: Set(destination_id),
            category_id: Set(category_id),
            topic_id: Set(topic_id),
            name: Set(source.name.clone()),
            description: Set(source.description.clone()),
            display_order: Set(source.display_order),
            created_at: Set(now),
            updated_at: Set(now),
        }))
    }
}

pub struct ContentCloner;

impl ContentCloner {
    fn optional_parent(
        source_id: i32,
        field: &str,
        parent: ParentRef,
        detached: &mut Vec<DetachedReference>,
    ) -> Option<i32> {
        if let ParentRef::Unresolved(missing_id) = parent {
            detached.push(DetachedReference {
                source_id,
                field: field.to_string(),
                missing_id,
            });
        }
        parent.resolved()
    }
}

impl LevelCloner for ContentCloner {
    type Entity = contents::Entity;
    type ActiveModel = contents::ActiveModel;

    const RECORDS_MAPPING: bool = false;

    fn row_id(model: &contents::Model) -> i32 {
        model.id
    }

    fn plan(
        source: &contents::Model,
        destination_id: i32,
        remapper: &IdentityRemapper,
        now: ChronoDateTimeUtc,
    ) -> Result<RowPlan<contents::ActiveModel>, CloneError> {
        let Some(category_id) = remapper.resolve(Level::Category, source.category_id)? else {
            return Ok(RowPlan::Drop(DroppedContent {
                source_id: source.id,
                reason: format!("category {} was not cloned", source.category_id),
            }));
        };

        let mut detached = Vec::new();
        let topic_id = Self::optional_parent(
            source.id,
            "topic_id",
            remapper.remap(Level::Topic, source.topic_id)?,
            &mut detached,
        );
        let factor_id = Self::optional_parent(
            source.id,
            "factor_id",
            remapper.remap(Level::Factor, source.factor_id)?,
            &mut detached,
        );

        let row = contents::ActiveModel {
            id: NotSet,
            container_id: Set(destination_id),
            category_id: Set(category_id),
            topic_id: Set(topic_id),
            factor_id: Set(factor_id),
            name: Set(source.name.clone()),
            description: Set(source.description.clone()),
            question: Set(source.question.clone()),
            answer_type: Set(source.answer_type.clone()),
            answer_options: Set(source.answer_options.clone()),
            placeholder: Set(source.placeholder.clone()),
            info_question: Set(source.info_question.clone()),
            info_answer: Set(source.info_answer.clone()),
            guidance: Set(source.guidance.clone()),
            is_required: Set(source.is_required),
            weight: Set(source.weight),
            likelihood_scale: Set(source.likelihood_scale.clone()),
            impact_scale: Set(source.impact_scale.clone()),
            control_rating: Set(source.control_rating.clone()),
            mitigation_hint: Set(source.mitigation_hint.clone()),
            evidence_hint: Set(source.evidence_hint.clone()),
            reference_code: Set(source.reference_code.clone()),
            owner_role: Set(source.owner_role.clone()),
            review_frequency: Set(source.review_frequency.clone()),
            notes: Set(source.notes.clone()),
            display_order: Set(source.display_order),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(RowPlan::Insert { row, detached })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sealed_remapper() -> IdentityRemapper {
        let mut remapper = IdentityRemapper::new();
        remapper.record(Level::Category, 1, 11).unwrap();
        remapper.seal(Level::Category);
        remapper.record(Level::Topic, 2, 22).unwrap();
        remapper.seal(Level::Topic);
        remapper
    }

    fn topic(category_id: Option<i32>) -> topics::Model {
        topics::Model {
            id: 2,
            container_id: 1,
            category_id,
            name: "Access control".to_string(),
            description: None,
            display_order: 4,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_topic_plan_remaps_category() {
        let plan = TopicCloner::plan(&topic(Some(1)), 9, &sealed_remapper(), Utc::now()).unwrap();
        let RowPlan::Insert { row, detached } = plan else {
            panic!("expected insert");
        };
        assert_eq!(row.category_id, Set(Some(11)));
        assert_eq!(row.container_id, Set(9));
        assert_eq!(row.display_order, Set(4));
        assert!(detached.is_empty());
    }

    #[test]
    fn test_topic_with_foreign_category_is_integrity_error() {
        let result = TopicCloner::plan(&topic(Some(99)), 9, &sealed_remapper(), Utc::now());
        match result {
            Err(CloneError::Integrity {
                level, source_id, ..
            }) => {
                assert_eq!(level, Level::Topic);
                assert_eq!(source_id, 2);
            }
            _ => panic!("expected integrity error"),
        }
    }

    #[test]
    fn test_topic_before_categories_is_out_of_order() {
        let remapper = IdentityRemapper::new();
        let result = TopicCloner::plan(&topic(Some(1)), 9, &remapper, Utc::now());
        assert!(matches!(result, Err(CloneError::OutOfOrder { .. })));

        // a topic without a category never consults the remapper
        assert!(TopicCloner::plan(&topic(None), 9, &remapper, Utc::now()).is_ok());
    }
}
