use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::level_cloner::{
    clone_level, CategoryCloner, ContentCloner, DetachedReference, DroppedContent, FactorCloner,
    TopicCloner,
};
use super::remapper::{CloneMappings, IdentityRemapper};
use crate::database::entities::{containers, Level};
use crate::errors::CloneError;

/// Result of a committed clone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneSummary {
    pub source_container_id: i32,
    pub destination_container_id: i32,
    pub categories_cloned: usize,
    pub topics_cloned: usize,
    pub factors_cloned: usize,
    pub contents_cloned: usize,
    pub dropped_contents: Vec<DroppedContent>,
    pub detached_references: Vec<DetachedReference>,
    pub mappings: CloneMappings,
}

/// Runs the four level cloners against one source/destination pair.
#[derive(Clone)]
pub struct StructureCloner {
    db: DatabaseConnection,
}

impl StructureCloner {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Copy the whole structure of `source_id` into `destination_id`.
    ///
    /// Both containers must exist. Either every level is committed or
    /// nothing is; the destination is left untouched on failure.
    pub async fn clone_structure(
        &self,
        source_id: i32,
        destination_id: i32,
    ) -> Result<CloneSummary, CloneError> {
        if source_id == destination_id {
            return Err(CloneError::SameContainer(source_id));
        }

        containers::Entity::find_by_id(destination_id)
            .one(&self.db)
            .await?
            .ok_or(CloneError::DestinationNotFound(destination_id))?;

        containers::Entity::find_by_id(source_id)
            .one(&self.db)
            .await?
            .ok_or(CloneError::SourceNotFound(source_id))?;

        let txn = self.db.begin().await?;

        match Self::clone_levels(&txn, source_id, destination_id).await {
            Ok(summary) => {
                txn.commit().await?;
                info!(
                    "Cloned container {} into {}: {} categories, {} topics, {} factors, {} contents ({} dropped)",
                    source_id,
                    destination_id,
                    summary.categories_cloned,
                    summary.topics_cloned,
                    summary.factors_cloned,
                    summary.contents_cloned,
                    summary.dropped_contents.len()
                );
                Ok(summary)
            }
            Err(err) => {
                error!(
                    "Clone of container {} into {} rolled back: {}",
                    source_id, destination_id, err
                );
                if let Err(rollback_err) = txn.rollback().await {
                    error!("Rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    async fn clone_levels<C: ConnectionTrait>(
        conn: &C,
        source_id: i32,
        destination_id: i32,
    ) -> Result<CloneSummary, CloneError> {
        let now = Utc::now();
        let mut remapper = IdentityRemapper::new();

        let categories =
            clone_level::<CategoryCloner, _>(conn, source_id, destination_id, &mut remapper, now)
                .await?;
        let topics =
            clone_level::<TopicCloner, _>(conn, source_id, destination_id, &mut remapper, now)
                .await?;
        let factors =
            clone_level::<FactorCloner, _>(conn, source_id, destination_id, &mut remapper, now)
                .await?;
        let contents =
            clone_level::<ContentCloner, _>(conn, source_id, destination_id, &mut remapper, now)
                .await?;

        debug!(
            "Remapped {} category, {} topic and {} factor ids",
            remapper.len(Level::Category),
            remapper.len(Level::Topic),
            remapper.len(Level::Factor)
        );

        Ok(CloneSummary {
            source_container_id: source_id,
            destination_container_id: destination_id,
            categories_cloned: categories.cloned,
            topics_cloned: topics.cloned,
            factors_cloned: factors.cloned,
            contents_cloned: contents.cloned,
            dropped_contents: contents.dropped,
            detached_references: contents.detached,
            mappings: remapper.into_mappings(),
        })
    }
}
