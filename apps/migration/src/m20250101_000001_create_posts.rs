use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Posts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Posts::Message).text().not_null())
                    .col(ColumnDef::new(Posts::PositionTop).double().not_null())
                    .col(ColumnDef::new(Posts::PositionLeft).double().not_null())
                    .col(ColumnDef::new(Posts::Color).string().not_null())
                    .col(ColumnDef::new(Posts::PinColor).string().not_null())
                    .col(ColumnDef::new(Posts::Rotation).double().not_null().default(0.0))
                    .col(ColumnDef::new(Posts::ZIndex).integer().not_null().default(1))
                    .col(ColumnDef::new(Posts::IsPinned).boolean().not_null().default(false))
                    .col(ColumnDef::new(Posts::Likes).big_integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Posts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Posts::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_expires_at")
                    .table(Posts::Table)
                    .col(Posts::ExpiresAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    Message,
    PositionTop,
    PositionLeft,
    Color,
    PinColor,
    Rotation,
    ZIndex,
    IsPinned,
    Likes,
    CreatedAt,
    ExpiresAt,
}
