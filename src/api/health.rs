//! 健康检查端点

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::services::AnalyticsService;

pub async fn health(analytics: web::Data<Arc<AnalyticsService>>) -> HttpResponse {
    let metrics = analytics.health_metrics().await;

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "cache_hit_rate": metrics.cache_hit_rate,
    }))
}
