use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Containers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Containers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Containers::Kind).string().not_null())
                    .col(ColumnDef::new(Containers::Name).string().not_null())
                    .col(ColumnDef::new(Containers::Description).text().null())
                    .col(ColumnDef::new(Containers::CompanyName).string().null())
                    .col(ColumnDef::new(Containers::AssessmentYear).integer().null())
                    .col(ColumnDef::new(Containers::SourceContainerId).integer().null())
                    .col(
                        ColumnDef::new(Containers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Containers::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Containers::UpdatedAt)
                            .date_time()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_containers_kind")
                    .table(Containers::Table)
                    .col(Containers::Kind)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Containers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Containers {
    Table,
    Id,
    Kind,
    Name,
    Description,
    CompanyName,
    AssessmentYear,
    SourceContainerId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
