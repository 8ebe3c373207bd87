use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::ContainerId).integer().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Description).text().null())
                    .col(
                        ColumnDef::new(Categories::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(&mut timestamp(Categories::CreatedAt))
                    .col(&mut timestamp(Categories::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_container")
                            .from(Categories::Table, Categories::ContainerId)
                            .to(Containers::Table, Containers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Topics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Topics::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Topics::ContainerId).integer().not_null())
                    .col(ColumnDef::new(Topics::CategoryId).integer().null())
                    .col(ColumnDef::new(Topics::Name).string().not_null())
                    .col(ColumnDef::new(Topics::Description).text().null())
                    .col(
                        ColumnDef::new(Topics::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(&mut timestamp(Topics::CreatedAt))
                    .col(&mut timestamp(Topics::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topics_container")
                            .from(Topics::Table, Topics::ContainerId)
                            .to(Containers::Table, Containers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topics_category")
                            .from(Topics::Table, Topics::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Factors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Factors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Factors::ContainerId).integer().not_null())
                    .col(ColumnDef::new(Factors::CategoryId).integer().null())
                    .col(ColumnDef::new(Factors::TopicId).integer().null())
                    .col(ColumnDef::new(Factors::Name).string().not_null())
                    .col(ColumnDef::new(Factors::Description).text().null())
                    .col(
                        ColumnDef::new(Factors::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(&mut timestamp(Factors::CreatedAt))
                    .col(&mut timestamp(Factors::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_factors_container")
                            .from(Factors::Table, Factors::ContainerId)
                            .to(Containers::Table, Containers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_factors_category")
                            .from(Factors::Table, Factors::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_factors_topic")
                            .from(Factors::Table, Factors::TopicId)
                            .to(Topics::Table, Topics::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Info fields and is_required arrive in a later migration.
        manager
            .create_table(
                Table::create()
                    .table(Contents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contents::ContainerId).integer().not_null())
                    .col(ColumnDef::new(Contents::CategoryId).integer().not_null())
                    .col(ColumnDef::new(Contents::TopicId).integer().null())
                    .col(ColumnDef::new(Contents::FactorId).integer().null())
                    .col(ColumnDef::new(Contents::Name).string().not_null())
                    .col(ColumnDef::new(Contents::Description).text().null())
                    .col(ColumnDef::new(Contents::Question).text().null())
                    .col(
                        ColumnDef::new(Contents::AnswerType)
                            .string()
                            .not_null()
                            .default("text"),
                    )
                    .col(ColumnDef::new(Contents::AnswerOptions).text().null())
                    .col(ColumnDef::new(Contents::Placeholder).string().null())
                    .col(ColumnDef::new(Contents::Guidance).text().null())
                    .col(ColumnDef::new(Contents::Weight).integer().null())
                    .col(ColumnDef::new(Contents::LikelihoodScale).string().null())
                    .col(ColumnDef::new(Contents::ImpactScale).string().null())
                    .col(ColumnDef::new(Contents::ControlRating).string().null())
                    .col(ColumnDef::new(Contents::MitigationHint).text().null())
                    .col(ColumnDef::new(Contents::EvidenceHint).text().null())
                    .col(ColumnDef::new(Contents::ReferenceCode).string().null())
                    .col(ColumnDef::new(Contents::OwnerRole).string().null())
                    .col(ColumnDef::new(Contents::ReviewFrequency).string().null())
                    .col(ColumnDef::new(Contents::Notes).text().null())
                    .col(
                        ColumnDef::new(Contents::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(&mut timestamp(Contents::CreatedAt))
                    .col(&mut timestamp(Contents::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contents_container")
                            .from(Contents::Table, Contents::ContainerId)
                            .to(Containers::Table, Containers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contents_category")
                            .from(Contents::Table, Contents::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contents_topic")
                            .from(Contents::Table, Contents::TopicId)
                            .to(Topics::Table, Topics::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contents_factor")
                            .from(Contents::Table, Contents::FactorId)
                            .to(Factors::Table, Factors::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Contents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Factors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Topics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await
    }
}

fn timestamp<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .date_time()
        .not_null()
        .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp))
        .to_owned()
}

#[derive(DeriveIden)]
enum Containers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    ContainerId,
    Name,
    Description,
    DisplayOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Topics {
    Table,
    Id,
    ContainerId,
    CategoryId,
    Name,
    Description,
    DisplayOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Factors {
    Table,
    Id,
    ContainerId,
    CategoryId,
    TopicId,
    Name,
    Description,
    DisplayOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Contents {
    Table,
    Id,
    ContainerId,
    CategoryId,
    TopicId,
    FactorId,
    Name,
    Description,
    Question,
    AnswerType,
    AnswerOptions,
    Placeholder,
    Guidance,
    Weight,
    LikelihoodScale,
    ImpactScale,
    ControlRating,
    MitigationHint,
    EvidenceHint,
    ReferenceCode,
    OwnerRole,
    ReviewFrequency,
    Notes,
    DisplayOrder,
    CreatedAt,
    UpdatedAt,
}
