use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Level, LevelEntity};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub container_id: i32,
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
    #[sea_orm(has_many = "super::topics::Entity")]
    Topics,
    #[sea_orm(has_many = "super::factors::Entity")]
    Factors,
    #[sea_orm(has_many = "super::contents::Entity")]
    Contents,
}

impl Related<super::containers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Containers.def()
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

impl Related<super::contents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl LevelEntity for Entity {
    const LEVEL: Level = Level::Category;

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
