//! 统计端点
//!
//! /analytics/user 需要网关身份头；/analytics/trend、
//! /analytics/top-links 与 /analytics/admin 需要管理令牌。

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::api::{caller_identity, error_response, verify_admin_token};
use crate::config::AppConfig;
use crate::errors::ShortifyError;
use crate::services::{AnalyticsService, RangeQuery};
use crate::storage::Granularity;

const DEFAULT_TOP_LIMIT: u64 = 10;
const MAX_TOP_LIMIT: u64 = 100;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    /// "daily"（默认）或 "hourly"
    #[serde(default)]
    pub granularity: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl AnalyticsQuery {
    fn range_query(&self) -> RangeQuery {
        RangeQuery {
            start: self.start.clone(),
            end: self.end.clone(),
            range: self.range.clone(),
        }
    }

    fn granularity(&self) -> Result<Granularity, ShortifyError> {
        match self.granularity.as_deref() {
            None | Some("daily") => Ok(Granularity::Daily),
            Some("hourly") => Ok(Granularity::Hourly),
            Some(other) => Err(ShortifyError::validation(format!(
                "Unknown granularity: \"{}\"",
                other
            ))),
        }
    }

    fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_TOP_LIMIT)
            .clamp(1, MAX_TOP_LIMIT)
    }
}

pub async fn trend(
    req: HttpRequest,
    query: web::Query<AnalyticsQuery>,
    analytics: web::Data<Arc<AnalyticsService>>,
    config: web::Data<AppConfig>,
) -> HttpResponse {
    if !verify_admin_token(&req, &config) {
        return unauthorized();
    }

    let granularity = match query.granularity() {
        Ok(g) => g,
        Err(e) => return error_response(&e),
    };

    match analytics
        .click_trend(&query.range_query(), granularity, None)
        .await
    {
        Ok(points) => HttpResponse::Ok().json(points),
        Err(e) => failure(e),
    }
}

pub async fn top_links(
    req: HttpRequest,
    query: web::Query<AnalyticsQuery>,
    analytics: web::Data<Arc<AnalyticsService>>,
    config: web::Data<AppConfig>,
) -> HttpResponse {
    if !verify_admin_token(&req, &config) {
        return unauthorized();
    }

    match analytics
        .top_links(&query.range_query(), query.limit(), None)
        .await
    {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => failure(e),
    }
}

pub async fn user_stats(
    req: HttpRequest,
    query: web::Query<AnalyticsQuery>,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> HttpResponse {
    let Some(owner) = caller_identity(&req) else {
        return HttpResponse::Unauthorized().json(json!({
            "error": "Missing caller identity",
        }));
    };

    match analytics
        .user_stats(&owner, &query.range_query(), query.limit())
        .await
    {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => failure(e),
    }
}

pub async fn admin_stats(
    req: HttpRequest,
    query: web::Query<AnalyticsQuery>,
    analytics: web::Data<Arc<AnalyticsService>>,
    config: web::Data<AppConfig>,
) -> HttpResponse {
    if !verify_admin_token(&req, &config) {
        return unauthorized();
    }

    match analytics
        .admin_stats(&query.range_query(), query.limit())
        .await
    {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => failure(e),
    }
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "error": "Invalid admin token",
    }))
}

/// 校验类错误原样返回，基础设施错误只暴露笼统消息
fn failure(e: ShortifyError) -> HttpResponse {
    if e.http_status().is_server_error() {
        error!("Analytics query failed: {}", e);
        HttpResponse::InternalServerError().json(json!({
            "error": "Server error",
        }))
    } else {
        error_response(&e)
    }
}
