//! 短码重定向端点
//!
//! 解析成功立即返回 302，点击事件在后台任务里记录，
//! 记录失败不影响跳转。404 响应允许短时间缓存。

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{debug, error};

use crate::services::{ClickContext, ClickRecorder, LinkService};
use crate::utils::ip::extract_client_ip;
use crate::utils::is_valid_short_code;

pub async fn redirect(
    req: HttpRequest,
    path: web::Path<String>,
    link_service: web::Data<Arc<LinkService>>,
    recorder: web::Data<Arc<ClickRecorder>>,
) -> HttpResponse {
    let code = path.into_inner();

    // 形状明显不对的路径直接 404，不查缓存也不查库
    if !is_valid_short_code(&code) {
        return not_found_response();
    }

    match link_service.resolve(&code).await {
        Ok(Some(long_url)) => {
            recorder.dispatch(ClickContext {
                code,
                client_ip: extract_client_ip(&req),
                user_agent: header_value(&req, "user-agent"),
                referrer: header_value(&req, "referer"),
            });

            HttpResponse::build(StatusCode::FOUND)
                .insert_header(("Location", long_url))
                .finish()
        }
        Ok(None) => {
            debug!("Short code not found: {}", code);
            not_found_response()
        }
        Err(e) => {
            error!("Resolve failed for code \"{}\": {}", code, e);
            HttpResponse::InternalServerError()
                .insert_header(("Content-Type", "text/html; charset=utf-8"))
                .body("Server Error")
        }
    }
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn not_found_response() -> HttpResponse {
    HttpResponse::build(StatusCode::NOT_FOUND)
        .insert_header(("Content-Type", "text/html; charset=utf-8"))
        .insert_header(("Cache-Control", "public, max-age=60"))
        .body("Not Found")
}
