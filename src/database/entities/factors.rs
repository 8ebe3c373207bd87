use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Level, LevelEntity};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "factors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub container_id: i32,
    pub category_id: Option<i32>,
    pub topic_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
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
        on_delete = "SetNull"
    )]
    Categories,
    #[sea_orm(
        belongs_to = "super::topics::Entity",
        from = "Column::TopicId",
        to = "super::topics::Column::Id",
        on_delete = "SetNull"
    )]
    Topics,
    #[sea_orm(has_many = "super::contents::Entity")]
    Contents,
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

impl Related<super::contents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl LevelEntity for Entity {
    const LEVEL: Level = Level::Factor;

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
