use sea_orm_migration::prelude::*;

use crate::m20250601_000001_create_metals::Metals;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MetalPrices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MetalPrices::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MetalPrices::MetalId).integer().not_null())
                    .col(ColumnDef::new(MetalPrices::Price).double().not_null())
                    .col(
                        ColumnDef::new(MetalPrices::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MetalPrices::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_metal_prices_metal_id")
                            .from(MetalPrices::Table, MetalPrices::MetalId)
                            .to(Metals::Table, Metals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint: one observation per metal per timestamp
        manager
            .create_index(
                Index::create()
                    .name("idx_metal_prices_metal_timestamp_unique")
                    .table(MetalPrices::Table)
                    .col(MetalPrices::MetalId)
                    .col(MetalPrices::Timestamp)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Range scans for history and analysis windows
        manager
            .create_index(
                Index::create()
                    .name("idx_metal_prices_timestamp")
                    .table(MetalPrices::Table)
                    .col(MetalPrices::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MetalPrices::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MetalPrices {
    Table,
    Id,
    MetalId,
    Price,
    Timestamp,
    CreatedAt,
}
