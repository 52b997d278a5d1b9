//! HTTP 接口层
//!
//! actix-web 路由与处理器。注意注册顺序：/shorten、/health 和
//! /analytics 都是固定路径，必须先于捕获一切的 /{code} 注册，
//! 否则会被短码路由吞掉。

use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;

use crate::config::AppConfig;
use crate::errors::ShortifyError;

mod analytics;
mod health;
mod redirect;
mod shorten;

/// 上游网关注入的调用方身份头
pub const IDENTITY_HEADER: &str = "x-auth-user";

/// 业务错误统一转 JSON 响应
pub(crate) fn error_response(err: &ShortifyError) -> HttpResponse {
    HttpResponse::build(err.http_status()).json(json!({
        "code": err.code(),
        "error": err.message(),
    }))
}

/// 读取网关身份头，空值视为匿名
pub(crate) fn caller_identity(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// 校验管理令牌（Bearer）；未配置令牌时管理端点整体禁用
pub(crate) fn verify_admin_token(req: &HttpRequest, config: &AppConfig) -> bool {
    let configured = &config.api.admin_token;
    if configured.is_empty() {
        return false;
    }

    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == configured)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/shorten", web::post().to(shorten::create_short_link))
        .route("/health", web::get().to(health::health))
        .service(
            web::scope("/analytics")
                .route("/trend", web::get().to(analytics::trend))
                .route("/top-links", web::get().to(analytics::top_links))
                .route("/user", web::get().to(analytics::user_stats))
                .route("/admin", web::get().to(analytics::admin_stats)),
        )
        .route("/{code}", web::get().to(redirect::redirect))
        .route("/{code}", web::head().to(redirect::redirect));
}
