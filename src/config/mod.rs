//! 配置管理模块

mod settings;

pub use settings::{
    AlertSettings, DatabaseSettings, EmotionThresholds, KeywordSettings, LoggingSettings,
    NoResponseThresholds, NotificationSettings, RetrySettings, Settings,
};
