//! 点击事件的统计查询
//!
//! 按时间分桶和分类维度的分组计数，供 AnalyticsService 调用。
//! 分组标签由数据库端的日期格式化表达式生成，补零在服务层完成
//! （数据库不会为无数据的分桶产出空分组）。

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, ExprTrait, Query};
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait,
};

use crate::errors::Result;
use migration::entities::{click_event, short_link};

/// 时间分桶粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Hourly,
}

// ============ 查询结果类型 ============

/// 趋势查询结果行
#[derive(Debug, FromQueryResult)]
pub struct TrendRow {
    pub label: String,
    pub count: i64,
}

/// 热门链接查询结果行
#[derive(Debug, FromQueryResult)]
pub struct TopLinkRow {
    pub short_code: String,
    pub count: i64,
}

/// 分类维度查询结果行
#[derive(Debug, FromQueryResult)]
pub struct BreakdownRow {
    pub key: Option<String>,
    pub count: i64,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

/// 根据数据库类型和分桶粒度生成日期格式化表达式
///
/// 标签格式与服务层补零时生成的分桶边界格式一致：
/// daily `%Y-%m-%d`，hourly `%Y-%m-%d %H:00`。
fn date_format_expr(backend: DbBackend, granularity: Granularity) -> Expr {
    let (sqlite_fmt, mysql_fmt, pg_fmt) = match granularity {
        Granularity::Hourly => ("%Y-%m-%d %H:00", "%Y-%m-%d %H:00", "YYYY-MM-DD HH24:00"),
        Granularity::Daily => ("%Y-%m-%d", "%Y-%m-%d", "YYYY-MM-DD"),
    };

    match backend {
        DbBackend::Sqlite => Expr::cust(format!("strftime('{}', clicked_at)", sqlite_fmt)),
        DbBackend::MySql => Expr::cust(format!("DATE_FORMAT(clicked_at, '{}')", mysql_fmt)),
        _ => Expr::cust(format!("TO_CHAR(clicked_at, '{}')", pg_fmt)),
    }
}

/// owner 过滤子查询：short_code IN (SELECT short_code FROM short_links WHERE owner = ?)
fn owned_codes_subquery(owner: &str) -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(short_link::Column::ShortCode)
        .from(short_link::Entity)
        .and_where(Expr::col(short_link::Column::Owner).eq(owner))
        .to_owned()
}

impl super::SeaOrmStorage {
    /// 分桶点击趋势（仅有数据的分桶，标签升序）
    pub async fn click_trend_rows(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
        owner: Option<&str>,
    ) -> Result<Vec<TrendRow>> {
        let date_expr = date_format_expr(self.backend(), granularity);

        click_event::Entity::find()
            .select_only()
            .column_as(date_expr.clone(), "label")
            .column_as(click_event::Column::Id.count(), "count")
            .filter(click_event::Column::ClickedAt.gte(start))
            .filter(click_event::Column::ClickedAt.lte(end))
            .apply_if(owner, |query, o| {
                query.filter(click_event::Column::ShortCode.in_subquery(owned_codes_subquery(o)))
            })
            .group_by(date_expr)
            .order_by_asc(Expr::cust("label"))
            .into_model::<TrendRow>()
            .all(self.get_db())
            .await
            .map_err(Into::into)
    }

    /// 热门链接（点击数降序）
    pub async fn top_link_rows(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u64,
        owner: Option<&str>,
    ) -> Result<Vec<TopLinkRow>> {
        click_event::Entity::find()
            .select_only()
            .column(click_event::Column::ShortCode)
            .column_as(click_event::Column::Id.count(), "count")
            .filter(click_event::Column::ClickedAt.gte(start))
            .filter(click_event::Column::ClickedAt.lte(end))
            .apply_if(owner, |query, o| {
                query.filter(click_event::Column::ShortCode.in_subquery(owned_codes_subquery(o)))
            })
            .group_by(click_event::Column::ShortCode)
            .order_by_desc(Expr::cust("count"))
            .limit(limit)
            .into_model::<TopLinkRow>()
            .all(self.get_db())
            .await
            .map_err(Into::into)
    }

    /// 单一分类维度的分组计数（device / browser / os / country）
    pub async fn breakdown_rows(
        &self,
        column: click_event::Column,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<BreakdownRow>> {
        click_event::Entity::find()
            .select_only()
            .column_as(Expr::col(column), "key")
            .column_as(click_event::Column::Id.count(), "count")
            .filter(click_event::Column::ClickedAt.gte(start))
            .filter(click_event::Column::ClickedAt.lte(end))
            .group_by(column)
            .order_by_desc(Expr::cust("count"))
            .limit(limit)
            .into_model::<BreakdownRow>()
            .all(self.get_db())
            .await
            .map_err(Into::into)
    }

    /// 区间内事件总数
    pub async fn count_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        owner: Option<&str>,
    ) -> Result<u64> {
        click_event::Entity::find()
            .filter(click_event::Column::ClickedAt.gte(start))
            .filter(click_event::Column::ClickedAt.lte(end))
            .apply_if(owner, |query, o| {
                query.filter(click_event::Column::ShortCode.in_subquery(owned_codes_subquery(o)))
            })
            .count(self.get_db())
            .await
            .map_err(Into::into)
    }

    /// 区间内 QR 扫码事件数
    pub async fn count_qr_events(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<u64> {
        click_event::Entity::find()
            .filter(click_event::Column::IsQr.eq(true))
            .filter(click_event::Column::ClickedAt.gte(start))
            .filter(click_event::Column::ClickedAt.lte(end))
            .count(self.get_db())
            .await
            .map_err(Into::into)
    }

    /// 区间内去重访客数（按 address_hash）
    pub async fn count_distinct_visitors(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64> {
        let row = click_event::Entity::find()
            .select_only()
            .column_as(Expr::cust("COUNT(DISTINCT address_hash)"), "count")
            .filter(click_event::Column::ClickedAt.gte(start))
            .filter(click_event::Column::ClickedAt.lte(end))
            .into_model::<CountRow>()
            .one(self.get_db())
            .await?;

        Ok(row.map(|r| r.count as u64).unwrap_or(0))
    }
}
