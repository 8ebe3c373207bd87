pub mod category_service;
pub mod container_service;
pub mod content_service;
pub mod factor_service;
pub mod level_queries;
pub mod pagination;
mod shared_strings;
pub mod structure_spreadsheet_service;
pub mod topic_service;
pub mod validation;

pub use category_service::*;
pub use container_service::*;
pub use content_service::*;
pub use factor_service::*;
pub use pagination::{ListQuery, Page};
pub use structure_spreadsheet_service::*;
pub use topic_service::*;
pub use validation::*;

use sea_orm::{ConnectionTrait, EntityTrait};

use crate::database::entities::containers;
use crate::errors::{CoreError, CoreResult};

/// Fail with NotFound unless the container exists.
pub(crate) async fn ensure_container<C: ConnectionTrait>(
    conn: &C,
    container_id: i32,
) -> CoreResult<containers::Model> {
    containers::Entity::find_by_id(container_id)
        .one(conn)
        .await
        .map_err(|e| CoreError::from_db("load container", e))?
        .ok_or_else(|| CoreError::not_found("container", container_id.to_string()))
}
