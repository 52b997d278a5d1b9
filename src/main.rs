use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use tracing::{info, warn};

use shortify::cache::build_cache;
use shortify::config::AppConfig;
use shortify::services::{AnalyticsService, ClickRecorder, GeoIpProvider, LinkService};
use shortify::storage::SeaOrmStorage;
use shortify::system::logging::init_logging;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    // guard 必须持有到进程结束，否则非阻塞日志会丢
    let _log_guard = init_logging(&config.logging);

    let storage = Arc::new(
        SeaOrmStorage::connect(&config.database.url, config.database.pool_size)
            .await
            .unwrap_or_else(|e| {
                eprintln!("Failed to initialize storage: {}", e);
                std::process::exit(1);
            }),
    );

    let cache = build_cache(&config.cache).unwrap_or_else(|e| {
        eprintln!("Failed to initialize cache: {}", e);
        std::process::exit(1);
    });

    let geoip = if config.analytics.geoip_api_url.is_empty() {
        warn!("GeoIP API not configured, click events will carry country=Unknown");
        None
    } else {
        Some(Arc::new(GeoIpProvider::new(&config.analytics.geoip_api_url)))
    };

    let link_service = Arc::new(LinkService::new(
        Arc::clone(&storage),
        Arc::clone(&cache),
        config.cache.default_ttl,
        config.rate_limit.clone(),
    ));
    let recorder = Arc::new(ClickRecorder::new(
        Arc::clone(&storage),
        geoip,
        config.analytics.ip_salt.clone(),
    ));
    let analytics = Arc::new(AnalyticsService::new(
        Arc::clone(&storage),
        Arc::clone(&cache),
    ));

    if config.api.admin_token.is_empty() {
        info!("Admin analytics endpoint disabled (api.admin_token not set)");
    }

    let bind_addr = (config.server.host.clone(), config.server.port);
    info!("Starting server at http://{}:{}", bind_addr.0, bind_addr.1);

    let app_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(app_config.clone()))
            .app_data(web::Data::new(Arc::clone(&link_service)))
            .app_data(web::Data::new(Arc::clone(&recorder)))
            .app_data(web::Data::new(Arc::clone(&analytics)))
            .configure(shortify::api::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
