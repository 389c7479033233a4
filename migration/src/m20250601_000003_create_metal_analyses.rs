use sea_orm_migration::prelude::*;

use crate::m20250601_000001_create_metals::Metals;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Append-only: one row per analysis run, never updated
        manager
            .create_table(
                Table::create()
                    .table(MetalAnalyses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MetalAnalyses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MetalAnalyses::MetalId).integer().not_null())
                    .col(ColumnDef::new(MetalAnalyses::Trend).string_len(20).not_null())
                    .col(ColumnDef::new(MetalAnalyses::Volatility).string_len(20).not_null())
                    .col(ColumnDef::new(MetalAnalyses::Sentiment).string_len(20).not_null())
                    .col(
                        ColumnDef::new(MetalAnalyses::PeriodStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MetalAnalyses::PeriodEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MetalAnalyses::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_metal_analyses_metal_id")
                            .from(MetalAnalyses::Table, MetalAnalyses::MetalId)
                            .to(Metals::Table, Metals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_metal_analyses_metal_id")
                    .table(MetalAnalyses::Table)
                    .col(MetalAnalyses::MetalId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MetalAnalyses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MetalAnalyses {
    Table,
    Id,
    MetalId,
    Trend,
    Volatility,
    Sentiment,
    PeriodStart,
    PeriodEnd,
    CreatedAt,
}
