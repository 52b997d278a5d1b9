//! 持久层
//!
//! SeaORM 封装，权威数据源。短链接表只增不删，click_count 是唯一
//! 会被修改的列；点击事件表追加写。缓存中的一切都可由这里重建。

use chrono::Utc;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, DbBackend, EntityTrait, ExprTrait, PaginatorTrait, QueryFilter, SqlErr,
};
use tracing::info;

use crate::errors::{Result, ShortifyError};
use migration::entities::{blacklist_entry, click_event, short_link};
use migration::{Migrator, MigratorTrait};

mod analytics;

pub use analytics::{BreakdownRow, Granularity, TopLinkRow, TrendRow};

/// 待追加的点击事件（地址已哈希，原始地址不进入本层）
#[derive(Debug, Clone)]
pub struct NewClickEvent {
    pub short_code: String,
    pub address_hash: String,
    pub device: String,
    pub browser: String,
    pub os: String,
    pub country: String,
    pub is_qr: bool,
    pub referrer: Option<String>,
    pub clicked_at: chrono::DateTime<Utc>,
}

pub struct SeaOrmStorage {
    db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 连接数据库并执行迁移
    pub async fn connect(database_url: &str, pool_size: u32) -> Result<Self> {
        let mut opt = ConnectOptions::new(database_url.to_owned());
        opt.max_connections(pool_size)
            .connect_timeout(std::time::Duration::from_secs(8))
            .acquire_timeout(std::time::Duration::from_secs(8))
            .sqlx_logging(false);

        let db = Database::connect(opt).await.map_err(|e| {
            ShortifyError::database_connection(format!("Database connection failed: {}", e))
        })?;

        Migrator::up(&db, None)
            .await
            .map_err(|e| ShortifyError::database_operation(format!("Migration failed: {}", e)))?;

        info!("Database connected, migrations applied");
        Ok(Self { db })
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn backend(&self) -> DbBackend {
        self.db.get_database_backend()
    }

    // ============ 短链接 ============

    pub async fn find_by_code(&self, code: &str) -> Result<Option<short_link::Model>> {
        short_link::Entity::find_by_id(code)
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_long_url(&self, long_url: &str) -> Result<Option<short_link::Model>> {
        short_link::Entity::find()
            .filter(short_link::Column::LongUrl.eq(long_url))
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 插入新链接
    ///
    /// 主键冲突由数据库唯一约束裁决并映射为 `AliasTaken`，
    /// 进程内的存在性检查只是优化，不是正确性来源。
    pub async fn insert_link(
        &self,
        code: &str,
        long_url: &str,
        owner: Option<&str>,
    ) -> Result<short_link::Model> {
        let model = short_link::ActiveModel {
            short_code: Set(code.to_string()),
            long_url: Set(long_url.to_string()),
            owner: Set(owner.map(String::from)),
            click_count: Set(0),
            created_at: Set(Utc::now()),
        };

        match model.insert(&self.db).await {
            Ok(inserted) => Ok(inserted),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(ShortifyError::alias_taken(
                    format!("Short code already exists: {}", code),
                )),
                _ => Err(e.into()),
            },
        }
    }

    /// 点击计数 +1（原子 UPDATE，不读-改-写）
    pub async fn increment_click(&self, code: &str) -> Result<()> {
        let stmt = Query::update()
            .table(short_link::Entity)
            .value(
                short_link::Column::ClickCount,
                Expr::col(short_link::Column::ClickCount).add(1),
            )
            .and_where(Expr::col(short_link::Column::ShortCode).eq(code))
            .to_owned();

        self.db.execute(&stmt).await?;
        Ok(())
    }

    pub async fn count_links_by_owner(&self, owner: &str) -> Result<u64> {
        short_link::Entity::find()
            .filter(short_link::Column::Owner.eq(owner))
            .count(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 批量取回短码对应的目标 URL（top-links 响应补全用）
    pub async fn find_links_by_codes(&self, codes: &[String]) -> Result<Vec<short_link::Model>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        short_link::Entity::find()
            .filter(short_link::Column::ShortCode.is_in(codes.iter().cloned()))
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    // ============ 黑名单 ============

    pub async fn is_domain_blacklisted(&self, hostname: &str) -> Result<bool> {
        let found = blacklist_entry::Entity::find_by_id(hostname)
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    pub async fn add_blacklist_domain(&self, domain: &str) -> Result<()> {
        let model = blacklist_entry::ActiveModel {
            domain: Set(domain.to_lowercase()),
        };
        match model.insert(&self.db).await {
            Ok(_) => Ok(()),
            // 重复加入视为幂等成功
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(()),
                _ => Err(e.into()),
            },
        }
    }

    // ============ 点击事件 ============

    pub async fn insert_click_event(&self, event: NewClickEvent) -> Result<()> {
        let model = click_event::ActiveModel {
            short_code: Set(event.short_code),
            address_hash: Set(event.address_hash),
            device: Set(event.device),
            browser: Set(event.browser),
            os: Set(event.os),
            country: Set(event.country),
            is_qr: Set(event.is_qr),
            referrer: Set(event.referrer),
            clicked_at: Set(event.clicked_at),
            ..Default::default()
        };

        model.insert(&self.db).await?;
        Ok(())
    }
}
