//! 统计聚合服务
//!
//! 在持久层分组查询之上做时间区间解析、分桶补零和多维度汇总。
//! 数据库只返回有数据的分桶，本层负责把区间内的空分桶补成 0，
//! 保证趋势序列连续且标签升序。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, DurationRound, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::cache::{StringCache, keys};
use crate::errors::{Result, ShortifyError};
use crate::storage::{Granularity, SeaOrmStorage};
use migration::entities::click_event;

/// 未指定区间时默认回看的天数
const DEFAULT_RANGE_DAYS: i64 = 14;
/// 区间上限，防止 hourly 补零产出过长的序列
const MAX_RANGE_DAYS: i64 = 366;
/// 分类维度每组返回的最大条目数
const BREAKDOWN_LIMIT: u64 = 20;

/// 原始的区间查询参数，三个字段都可缺省
#[derive(Debug, Clone, Default)]
pub struct RangeQuery {
    /// 起点，RFC 3339 或 `YYYY-MM-DD`
    pub start: Option<String>,
    /// 终点，格式同上
    pub end: Option<String>,
    /// 相对区间标记，如 `7d`；与 start/end 互斥时以 start/end 优先
    pub range: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub bucket: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopLinkStat {
    pub short_code: String,
    pub long_url: Option<String>,
    pub clicks: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakdownEntry {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct Breakdowns {
    pub devices: Vec<BreakdownEntry>,
    pub browsers: Vec<BreakdownEntry>,
    pub oses: Vec<BreakdownEntry>,
    pub countries: Vec<BreakdownEntry>,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub total_clicks: u64,
    pub unique_visitors: u64,
    pub qr_scans: u64,
    pub trend: Vec<TrendPoint>,
    pub top_links: Vec<TopLinkStat>,
    #[serde(flatten)]
    pub breakdowns: Breakdowns,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total_links: u64,
    pub total_clicks: u64,
    pub top_links: Vec<TopLinkStat>,
    pub trend: Vec<TrendPoint>,
}

#[derive(Debug, Serialize)]
pub struct HealthMetrics {
    /// 缓存命中率 [0,1]；缓存不可用或尚无统计时为 None
    pub cache_hit_rate: Option<f64>,
}

pub struct AnalyticsService {
    storage: Arc<SeaOrmStorage>,
    cache: Arc<dyn StringCache>,
}

impl AnalyticsService {
    pub fn new(storage: Arc<SeaOrmStorage>, cache: Arc<dyn StringCache>) -> Self {
        Self { storage, cache }
    }

    /// 分桶点击趋势，区间内无数据的分桶补 0
    pub async fn click_trend(
        &self,
        query: &RangeQuery,
        granularity: Granularity,
        owner: Option<&str>,
    ) -> Result<Vec<TrendPoint>> {
        let (start, end) = resolve_range(query)?;

        let rows = self
            .storage
            .click_trend_rows(start, end, granularity, owner)
            .await?;

        let counts: HashMap<String, i64> = rows.into_iter().map(|r| (r.label, r.count)).collect();

        let points = bucket_labels(start, end, granularity)
            .into_iter()
            .map(|label| {
                let count = counts.get(&label).copied().unwrap_or(0);
                TrendPoint {
                    bucket: label,
                    count,
                }
            })
            .collect();

        Ok(points)
    }

    /// 热门链接，目标 URL 从短链接表批量补全（已删不到的留 None）
    pub async fn top_links(
        &self,
        query: &RangeQuery,
        limit: u64,
        owner: Option<&str>,
    ) -> Result<Vec<TopLinkStat>> {
        let (start, end) = resolve_range(query)?;

        let rows = self.storage.top_link_rows(start, end, limit, owner).await?;

        let codes: Vec<String> = rows.iter().map(|r| r.short_code.clone()).collect();
        let urls: HashMap<String, String> = self
            .storage
            .find_links_by_codes(&codes)
            .await?
            .into_iter()
            .map(|link| (link.short_code, link.long_url))
            .collect();

        Ok(rows
            .into_iter()
            .map(|r| TopLinkStat {
                long_url: urls.get(&r.short_code).cloned(),
                short_code: r.short_code,
                clicks: r.count,
            })
            .collect())
    }

    /// 四个分类维度并发查询
    pub async fn breakdowns(&self, query: &RangeQuery) -> Result<Breakdowns> {
        let (start, end) = resolve_range(query)?;

        let (devices, browsers, oses, countries) = tokio::try_join!(
            self.storage
                .breakdown_rows(click_event::Column::Device, start, end, BREAKDOWN_LIMIT),
            self.storage
                .breakdown_rows(click_event::Column::Browser, start, end, BREAKDOWN_LIMIT),
            self.storage
                .breakdown_rows(click_event::Column::Os, start, end, BREAKDOWN_LIMIT),
            self.storage
                .breakdown_rows(click_event::Column::Country, start, end, BREAKDOWN_LIMIT),
        )?;

        Ok(Breakdowns {
            devices: to_entries(devices),
            browsers: to_entries(browsers),
            oses: to_entries(oses),
            countries: to_entries(countries),
        })
    }

    /// 全站统计（管理端）
    pub async fn admin_stats(&self, query: &RangeQuery, top_limit: u64) -> Result<AdminStats> {
        let (start, end) = resolve_range(query)?;

        let (total_clicks, unique_visitors, qr_scans) = tokio::try_join!(
            self.storage.count_events(start, end, None),
            self.storage.count_distinct_visitors(start, end),
            self.storage.count_qr_events(start, end),
        )?;

        let trend = self.click_trend(query, Granularity::Daily, None).await?;
        let top_links = self.top_links(query, top_limit, None).await?;
        let breakdowns = self.breakdowns(query).await?;

        Ok(AdminStats {
            total_clicks,
            unique_visitors,
            qr_scans,
            trend,
            top_links,
            breakdowns,
        })
    }

    /// 单用户统计
    pub async fn user_stats(
        &self,
        owner: &str,
        query: &RangeQuery,
        top_limit: u64,
    ) -> Result<UserStats> {
        let (start, end) = resolve_range(query)?;

        let (total_links, total_clicks) = tokio::try_join!(
            self.storage.count_links_by_owner(owner),
            self.storage.count_events(start, end, Some(owner)),
        )?;

        let top_links = self.top_links(query, top_limit, Some(owner)).await?;
        let trend = self
            .click_trend(query, Granularity::Daily, Some(owner))
            .await?;

        Ok(UserStats {
            total_links,
            total_clicks,
            top_links,
            trend,
        })
    }

    /// 缓存命中率，读取计数器失败时降级为 None 而非报错
    pub async fn health_metrics(&self) -> HealthMetrics {
        let hits = self.cache.get(keys::CACHE_HITS).await;
        let misses = self.cache.get(keys::CACHE_MISSES).await;

        let (hits, misses) = match (hits, misses) {
            (Ok(h), Ok(m)) => (parse_counter(h), parse_counter(m)),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Cache counter read failed: {}", e);
                return HealthMetrics {
                    cache_hit_rate: None,
                };
            }
        };

        let total = hits + misses;
        let cache_hit_rate = if total > 0 {
            Some(hits as f64 / total as f64)
        } else {
            None
        };

        HealthMetrics { cache_hit_rate }
    }
}

fn parse_counter(value: Option<String>) -> i64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}

fn to_entries(rows: Vec<crate::storage::BreakdownRow>) -> Vec<BreakdownEntry> {
    rows.into_iter()
        .map(|r| BreakdownEntry {
            key: r.key.unwrap_or_else(|| "unknown".to_string()),
            count: r.count,
        })
        .collect()
}

// ============ 区间解析与分桶边界 ============

/// 把查询参数解析为闭区间 [start, end]
///
/// 优先级：显式 start/end > `Nd` 相对标记 > 默认回看 14 天。
/// `7d` 含今天共 7 个自然日，所以起点是 `end - 6d`。
pub fn resolve_range(query: &RangeQuery) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let now = Utc::now();

    let (start, end) = match (&query.start, &query.end) {
        (Some(s), Some(e)) => (parse_date(s, false)?, parse_date(e, true)?),
        (Some(s), None) => (parse_date(s, false)?, now),
        _ => {
            let days = query
                .range
                .as_deref()
                .map_or(DEFAULT_RANGE_DAYS, parse_range_days);
            (now - Duration::days(days - 1), now)
        }
    };

    if start > end {
        return Err(ShortifyError::validation("Range start is after range end"));
    }
    if end - start > Duration::days(MAX_RANGE_DAYS) {
        return Err(ShortifyError::validation(format!(
            "Range exceeds the maximum of {} days",
            MAX_RANGE_DAYS
        )));
    }

    Ok((start, end))
}

/// `7d` / `30d` 形式的相对区间标记，无法解析时退回默认区间
fn parse_range_days(token: &str) -> i64 {
    token
        .strip_suffix('d')
        .and_then(|n| n.parse().ok())
        .filter(|n| (1..=MAX_RANGE_DAYS).contains(n))
        .unwrap_or_else(|| {
            warn!("Unparsable range token \"{}\", using default window", token);
            DEFAULT_RANGE_DAYS
        })
}

/// RFC 3339 或 `YYYY-MM-DD`；纯日期作为终点时取到当天末尾
fn parse_date(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ShortifyError::validation(format!("Invalid date: \"{}\"", raw)))?;

    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()
    } else {
        NaiveTime::default()
    };

    Ok(date.and_time(time).and_utc())
}

/// 生成区间内的全部分桶标签，升序，与数据库端格式化表达式一致
fn bucket_labels(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    granularity: Granularity,
) -> Vec<String> {
    match granularity {
        Granularity::Daily => {
            let mut labels = Vec::new();
            let mut day = start.date_naive();
            let last = end.date_naive();
            while day <= last {
                labels.push(day.format("%Y-%m-%d").to_string());
                match day.succ_opt() {
                    Some(next) => day = next,
                    None => break,
                }
            }
            labels
        }
        Granularity::Hourly => {
            let mut labels = Vec::new();
            let mut hour = start
                .duration_trunc(Duration::hours(1))
                .unwrap_or(start);
            while hour <= end {
                labels.push(hour.format("%Y-%m-%d %H:00").to_string());
                hour += Duration::hours(1);
            }
            labels
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_daily_labels_cover_every_day() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 4, 2, 0, 0).unwrap();
        let labels = bucket_labels(start, end, Granularity::Daily);
        assert_eq!(
            labels,
            vec!["2025-03-01", "2025-03-02", "2025-03-03", "2025-03-04"]
        );
    }

    #[test]
    fn test_hourly_labels_align_to_hour() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 22, 30, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 2, 1, 10, 0).unwrap();
        let labels = bucket_labels(start, end, Granularity::Hourly);
        assert_eq!(
            labels,
            vec![
                "2025-03-01 22:00",
                "2025-03-01 23:00",
                "2025-03-02 00:00",
                "2025-03-02 01:00"
            ]
        );
    }

    #[test]
    fn test_resolve_range_defaults_to_14_days() {
        let (start, end) = resolve_range(&RangeQuery::default()).unwrap();
        assert_eq!((end - start).num_days(), DEFAULT_RANGE_DAYS - 1);
    }

    #[test]
    fn test_resolve_range_relative_token() {
        let query = RangeQuery {
            range: Some("7d".to_string()),
            ..Default::default()
        };
        let (start, end) = resolve_range(&query).unwrap();
        assert_eq!((end - start).num_days(), 6);
    }

    #[test]
    fn test_resolve_range_falls_back_on_bad_token() {
        let query = RangeQuery {
            range: Some("sideways".to_string()),
            ..Default::default()
        };
        let (start, end) = resolve_range(&query).unwrap();
        assert_eq!((end - start).num_days(), DEFAULT_RANGE_DAYS - 1);
    }

    #[test]
    fn test_resolve_range_explicit_dates() {
        let query = RangeQuery {
            start: Some("2025-03-01".to_string()),
            end: Some("2025-03-03".to_string()),
            ..Default::default()
        };
        let (start, end) = resolve_range(&query).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 3, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_resolve_range_rejects_inverted() {
        let query = RangeQuery {
            start: Some("2025-03-05".to_string()),
            end: Some("2025-03-01".to_string()),
            ..Default::default()
        };
        assert!(resolve_range(&query).is_err());
    }

    #[test]
    fn test_resolve_range_caps_span() {
        let query = RangeQuery {
            start: Some("2020-01-01".to_string()),
            end: Some("2025-01-01".to_string()),
            ..Default::default()
        };
        assert!(resolve_range(&query).is_err());
    }
}
