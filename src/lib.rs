//! Carewatch - 老人关怀异常检测与监护人通知核心库
//!
//! 两个子系统：
//! - 异常检测：情绪模式、无回应、危险关键词分析器，经调度器按预警类型分发
//! - 通知投递：重试 → 历史记录 → 主备切换 → 主渠道 的固定顺序管道
//!
//! 预警历史按 (对象, 规则, 类型, 日期) 去重，PostgreSQL 与内存存储均可使用。

pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod services;
pub mod telemetry;
pub mod utils;

pub use errors::{AppError, NotificationError};

/// 加载 `.env` 与配置文件，并初始化日志
pub fn init() -> Result<config::Settings, AppError> {
    dotenvy::dotenv().ok();
    let settings = config::Settings::load()?;
    telemetry::init_tracing(&settings.logging);
    tracing::info!("配置加载完成");
    Ok(settings)
}
