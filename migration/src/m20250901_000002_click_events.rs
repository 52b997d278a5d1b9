use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 click_events 表（追加写，不做外键约束）
        manager
            .create_table(
                Table::create()
                    .table(ClickEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickEvent::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClickEvent::ShortCode).string().not_null())
                    .col(ColumnDef::new(ClickEvent::AddressHash).string().not_null())
                    .col(ColumnDef::new(ClickEvent::Device).string().not_null())
                    .col(ColumnDef::new(ClickEvent::Browser).string().not_null())
                    .col(ColumnDef::new(ClickEvent::Os).string().not_null())
                    .col(ColumnDef::new(ClickEvent::Country).string().not_null())
                    .col(
                        ColumnDef::new(ClickEvent::IsQr)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ClickEvent::Referrer).text().null())
                    .col(
                        ColumnDef::new(ClickEvent::ClickedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 时间范围查询索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_clicked_at")
                    .table(ClickEvent::Table)
                    .col(ClickEvent::ClickedAt)
                    .to_owned(),
            )
            .await?;

        // 按短码聚合索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_short_code")
                    .table(ClickEvent::Table)
                    .col(ClickEvent::ShortCode)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_click_events_short_code")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_click_events_clicked_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ClickEvent::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClickEvent {
    #[sea_orm(iden = "click_events")]
    Table,
    Id,
    ShortCode,
    AddressHash,
    Device,
    Browser,
    Os,
    Country,
    IsQr,
    Referrer,
    ClickedAt,
}
