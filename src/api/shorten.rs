//! 创建短链接端点

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{caller_identity, error_response};
use crate::config::AppConfig;
use crate::services::{LinkService, ShortenRequest};
use crate::utils::ip::extract_client_ip;

#[derive(Debug, Deserialize)]
pub struct ShortenBody {
    pub url: String,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_url: String,
    pub short_code: String,
}

pub async fn create_short_link(
    req: HttpRequest,
    body: web::Json<ShortenBody>,
    link_service: web::Data<Arc<LinkService>>,
    config: web::Data<AppConfig>,
) -> HttpResponse {
    let body = body.into_inner();

    let request = ShortenRequest {
        long_url: body.url,
        alias: body.alias,
        client_ip: extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string()),
        owner: caller_identity(&req),
    };

    match link_service.shorten(request).await {
        Ok(code) => {
            info!("Short link created: {}", code);
            let base = config.server.base_url.trim_end_matches('/');
            HttpResponse::Ok().json(ShortenResponse {
                short_url: format!("{}/{}", base, code),
                short_code: code,
            })
        }
        Err(e) => error_response(&e),
    }
}
