use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXED_TABLES: [&str; 4] = ["categories", "topics", "factors", "contents"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in INDEXED_TABLES {
            manager
                .create_index(
                    Index::create()
                        .name(format!("idx_{}_container_order", table))
                        .table(Alias::new(table))
                        .col(Alias::new("container_id"))
                        .col(Alias::new("display_order"))
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in INDEXED_TABLES {
            manager
                .drop_index(
                    Index::drop()
                        .name(format!("idx_{}_container_order", table))
                        .table(Alias::new(table))
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}
