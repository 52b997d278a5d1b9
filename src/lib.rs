//! Shortify - 短链接解析与点击统计服务
//!
//! # Architecture
//! - `cache`: 字符串缓存抽象（Redis / 进程内）与键命名
//! - `storage`: SeaORM 持久层与统计查询
//! - `services`: 链接创建/解析、点击记录、统计聚合
//! - `api`: actix-web HTTP 接口
//! - `config`: 配置加载
//! - `system`: 日志等系统级设施
//! - `utils`: URL 归一化、IP 提取等工具

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
