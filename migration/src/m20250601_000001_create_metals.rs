use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Metals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Metals::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Metals::Symbol)
                            .string_len(10)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Metals::Name).string_len(50).not_null())
                    // Quotation unit with a currency prefix, e.g. "USD/oz"
                    .col(ColumnDef::new(Metals::Unit).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Metals::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Metals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Metals::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Metals {
    Table,
    Id,
    Symbol,
    Name,
    Unit,
    CreatedAt,
    UpdatedAt,
}
