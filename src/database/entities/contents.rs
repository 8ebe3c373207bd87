use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Level, LevelEntity};

/// One questionnaire question / field group. The form-field columns are
/// plain values copied verbatim whenever a structure is cloned.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub container_id: i32,
    pub category_id: i32,
    pub topic_id: Option<i32>,
    pub factor_id: Option<i32>,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>, // HTML rich text
    #[sea_orm(column_type = "Text", nullable)]
    pub question: Option<String>,
    pub answer_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub answer_options: Option<String>, // JSON array of option labels
    pub placeholder: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub info_question: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub info_answer: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub guidance: Option<String>,
    pub is_required: bool,
    pub weight: Option<i32>,
    pub likelihood_scale: Option<String>,
    pub impact_scale: Option<String>,
    pub control_rating: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub mitigation_hint: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub evidence_hint: Option<String>,
    pub reference_code: Option<String>,
    pub owner_role: Option<String>,
    pub review_frequency: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub display_order: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::containers::Entity",
        from = "Column::ContainerId",
        to = "super::containers::Column::Id",
        on_delete = "Cascade"
    )]
    Containers,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_delete = "Cascade"
    )]
    Categories,
    #[sea_orm(
        belongs_to = "super::topics::Entity",
        from = "Column::TopicId",
        to = "super::topics::Column::Id",
        on_delete = "SetNull"
    )]
    Topics,
    #[sea_orm(
        belongs_to = "super::factors::Entity",
        from = "Column::FactorId",
        to = "super::factors::Column::Id",
        on_delete = "SetNull"
    )]
    Factors,
}

impl Related<super::containers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Containers.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::topics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topics.def()
    }
}

impl Related<super::factors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Factors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl LevelEntity for Entity {
    const LEVEL: Level = Level::Content;

    fn id_column() -> Column {
        Column::Id
    }

    fn container_column() -> Column {
        Column::ContainerId
    }

    fn order_column() -> Column {
        Column::DisplayOrder
    }

    fn name_column() -> Column {
        Column::Name
    }
}
