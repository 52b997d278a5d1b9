//! 日志系统初始化
//!
//! 基于 tracing 的非阻塞日志，支持文件输出与 JSON 格式。
//! 返回的 WorkerGuard 必须在整个进程生命周期内持有，
//! 否则缓冲中的日志会丢失。

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// 初始化日志系统，进程启动时调用一次
///
/// # Panics
/// 日志文件无法打开或全局 subscriber 已被设置时 panic，
/// 这两种情况都只会出现在启动阶段。
pub fn init_logging(config: &LoggingConfig) -> WorkerGuard {
    let writer: Box<dyn std::io::Write + Send + Sync> = if config.file.is_empty() {
        Box::new(std::io::stdout())
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file)
            .expect("Failed to open log file");
        Box::new(file)
    };

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = EnvFilter::new(config.level.clone());

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(config.file.is_empty());

    if config.format == "json" {
        subscriber_builder.json().init();
    } else {
        subscriber_builder.init();
    }

    guard
}
