//! 业务服务层
//!
//! 链接创建/解析、点击记录与统计聚合的编排逻辑，
//! 依赖通过构造函数显式注入。

pub mod analytics_service;
pub mod blacklist;
pub mod click_recorder;
pub mod codegen;
pub mod geoip;
pub mod link_service;
pub mod rate_limit;
pub mod ua_parser;

pub use analytics_service::{AnalyticsService, RangeQuery};
pub use click_recorder::{ClickContext, ClickRecorder};
pub use geoip::GeoIpProvider;
pub use link_service::{LinkService, ShortenRequest};
