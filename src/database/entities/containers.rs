use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::ContainerKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "containers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub kind: String, // "template" | "assessment"
    pub name: String,
    pub description: Option<String>,
    pub company_name: Option<String>,
    pub assessment_year: Option<i32>,
    pub source_container_id: Option<i32>,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::categories::Entity")]
    Categories,
    #[sea_orm(has_many = "super::topics::Entity")]
    Topics,
    #[sea_orm(has_many = "super::factors::Entity")]
    Factors,
    #[sea_orm(has_many = "super::contents::Entity")]
    Contents,
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

impl Related<super::contents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn container_kind(&self) -> Option<ContainerKind> {
        self.kind.parse().ok()
    }

    pub fn is_template(&self) -> bool {
        self.container_kind() == Some(ContainerKind::Template)
    }
}
