use std::collections::HashSet;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};
use tracing::debug;

use crate::database::entities::LevelEntity;
use crate::errors::{CoreError, CoreErrorKind, CoreResult};

/// Load one row of a level, scoped to its container.
pub async fn find_in_container<E, C>(conn: &C, container_id: i32, id: i32) -> CoreResult<E::Model>
where
    E: LevelEntity,
    C: ConnectionTrait,
{
    E::find()
        .filter(E::id_column().eq(id))
        .filter(E::container_column().eq(container_id))
        .one(conn)
        .await
        .map_err(|e| CoreError::from_db(&format!("load {} {}", E::LEVEL, id), e))?
        .ok_or_else(|| CoreError::not_found(E::LEVEL.to_string(), id.to_string()))
}

/// Display order that appends a new row after the last one.
pub async fn next_display_order<E, C>(conn: &C, container_id: i32) -> CoreResult<i32>
where
    E: LevelEntity,
    C: ConnectionTrait,
{
    let current: Option<Option<i32>> = E::find()
        .select_only()
        .column_as(E::order_column().max(), "max_order")
        .filter(E::container_column().eq(container_id))
        .into_tuple()
        .one(conn)
        .await
        .map_err(|e| CoreError::from_db(&format!("read {} order", E::LEVEL), e))?;

    Ok(current.flatten().unwrap_or(0) + 1)
}

pub async fn delete_in_container<E, C>(conn: &C, container_id: i32, id: i32) -> CoreResult<()>
where
    E: LevelEntity,
    C: ConnectionTrait,
{
    let result = E::delete_many()
        .filter(E::id_column().eq(id))
        .filter(E::container_column().eq(container_id))
        .exec(conn)
        .await
        .map_err(|e| CoreError::from_db(&format!("delete {} {}", E::LEVEL, id), e))?;

    if result.rows_affected == 0 {
        return Err(CoreError::not_found(E::LEVEL.to_string(), id.to_string()));
    }
    Ok(())
}

/// Assign display_order 1..n following `ordered_ids`.
///
/// Every id must belong to the container and appear once. Rows not listed
/// keep their current order.
pub async fn reorder<E>(db: &DatabaseConnection, container_id: i32, ordered_ids: &[i32]) -> CoreResult<()>
where
    E: LevelEntity,
{
    let mut seen = HashSet::new();
    if let Some(duplicate) = ordered_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(CoreError::invalid_field(
            "ids",
            format!("{} id {} listed more than once", E::LEVEL, duplicate),
        ));
    }

    let txn = db.begin().await?;

    let existing: HashSet<i32> = E::find()
        .select_only()
        .column(E::id_column())
        .filter(E::container_column().eq(container_id))
        .into_tuple::<i32>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();

    let foreign: Vec<String> = ordered_ids
        .iter()
        .filter(|id| !existing.contains(id))
        .map(i32::to_string)
        .collect();
    if !foreign.is_empty() {
        return Err(CoreError::invalid_field(
            "ids",
            format!(
                "{} ids not in container {}: {}",
                E::LEVEL,
                container_id,
                foreign.join(", ")
            ),
        ));
    }

    for (index, id) in ordered_ids.iter().enumerate() {
        E::update_many()
            .col_expr(E::order_column(), Expr::value(display_position(index)?))
            .filter(E::id_column().eq(*id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;
    debug!(
        "Reordered {} {} rows in container {}",
        ordered_ids.len(),
        E::LEVEL,
        container_id
    );
    Ok(())
}

/// 1-based display order of the `index`th id in a reorder list.
fn display_position(index: usize) -> CoreResult<i32> {
    index
        .checked_add(1)
        .and_then(|position| i32::try_from(position).ok())
        .ok_or_else(|| CoreError::invalid_field("ids", format!("position {} is out of range", index)))
}

/// Load an optional parent reference, rejecting ids from other containers
/// as a validation failure on `field`.
pub async fn parent_in_container<E, C>(
    conn: &C,
    container_id: i32,
    field: &str,
    id: Option<i32>,
) -> CoreResult<Option<E::Model>>
where
    E: LevelEntity,
    C: ConnectionTrait,
{
    let Some(id) = id else {
        return Ok(None);
    };

    match find_in_container::<E, C>(conn, container_id, id).await {
        Ok(parent) => Ok(Some(parent)),
        Err(err) if err.kind() == CoreErrorKind::NotFound => Err(CoreError::invalid_field(
            field,
            format!("{} {} is not part of container {}", E::LEVEL, id, container_id),
        )),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_position() {
        assert_eq!(display_position(0).unwrap(), 1);
        assert_eq!(display_position(41).unwrap(), 42);
        assert_eq!(display_position(i32::MAX as usize - 1).unwrap(), i32::MAX);

        let err = display_position(i32::MAX as usize).unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);
        assert!(display_position(usize::MAX).is_err());
    }
}
