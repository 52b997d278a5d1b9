use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 short_links 表
        manager
            .create_table(
                Table::create()
                    .table(ShortLink::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShortLink::ShortCode)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShortLink::LongUrl).text().not_null())
                    .col(ColumnDef::new(ShortLink::Owner).string().null())
                    .col(
                        ColumnDef::new(ShortLink::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ShortLink::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // long_url 索引：默认路径按归一化 URL 反查已有映射
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_short_links_long_url")
                    .table(ShortLink::Table)
                    .col(ShortLink::LongUrl)
                    .to_owned(),
            )
            .await?;

        // owner 索引：用户侧统计按归属者过滤
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_short_links_owner")
                    .table(ShortLink::Table)
                    .col(ShortLink::Owner)
                    .to_owned(),
            )
            .await?;

        // 创建 blacklist 表
        manager
            .create_table(
                Table::create()
                    .table(Blacklist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Blacklist::Domain)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_short_links_owner").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_short_links_long_url").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Blacklist::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ShortLink::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShortLink {
    #[sea_orm(iden = "short_links")]
    Table,
    ShortCode,
    LongUrl,
    Owner,
    ClickCount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Blacklist {
    Table,
    Domain,
}
