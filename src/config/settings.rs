//! 应用配置加载和管理

use config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use std::env;

/// 应用配置结构
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub alert: AlertSettings,
    #[serde(default)]
    pub notification: NotificationSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    #[serde(default)]
    pub require_ssl: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
            require_ssl: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 5 }
fn default_idle_timeout() -> u64 { 600 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// EnvFilter 指令，如 `info,carewatch=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` 或 `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info,carewatch=debug".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

/// 异常检测与预警配置
#[derive(Debug, Clone, Deserialize)]
pub struct AlertSettings {
    /// 默认分析窗口（天）
    #[serde(default = "default_analysis_days")]
    pub analysis_days: u32,
    #[serde(default)]
    pub emotion: EmotionThresholds,
    #[serde(default)]
    pub no_response: NoResponseThresholds,
    #[serde(default)]
    pub keyword: KeywordSettings,
    /// 监护人通知标题模板，`{level}` 替换为级别代码（如 `HIGH`）
    #[serde(default = "default_title_template")]
    pub title_template: String,
    /// 批量巡检时并发处理的对象数
    #[serde(default = "default_sweep_concurrency")]
    pub sweep_concurrency: usize,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            analysis_days: default_analysis_days(),
            emotion: EmotionThresholds::default(),
            no_response: NoResponseThresholds::default(),
            keyword: KeywordSettings::default(),
            title_template: default_title_template(),
            sweep_concurrency: default_sweep_concurrency(),
        }
    }
}

impl AlertSettings {
    /// 按级别渲染通知标题
    pub fn render_title(&self, level_name: &str) -> String {
        self.title_template.replace("{level}", level_name)
    }
}

fn default_analysis_days() -> u32 { 7 }
fn default_title_template() -> String { "[케어워치 알림] {level} 단계 이상징후 감지".to_string() }
fn default_sweep_concurrency() -> usize { 1 }

/// 情绪模式分级阈值
#[derive(Debug, Clone, Deserialize)]
pub struct EmotionThresholds {
    #[serde(default = "default_emotion_high_run")]
    pub high_consecutive: usize,
    #[serde(default = "default_emotion_high_ratio")]
    pub high_ratio: f64,
    #[serde(default = "default_emotion_medium_run")]
    pub medium_consecutive: usize,
    #[serde(default = "default_emotion_medium_ratio")]
    pub medium_ratio: f64,
}

impl Default for EmotionThresholds {
    fn default() -> Self {
        Self {
            high_consecutive: default_emotion_high_run(),
            high_ratio: default_emotion_high_ratio(),
            medium_consecutive: default_emotion_medium_run(),
            medium_ratio: default_emotion_medium_ratio(),
        }
    }
}

fn default_emotion_high_run() -> usize { 3 }
fn default_emotion_high_ratio() -> f64 { 0.7 }
fn default_emotion_medium_run() -> usize { 2 }
fn default_emotion_medium_ratio() -> f64 { 0.5 }

/// 无回应分级阈值
#[derive(Debug, Clone, Deserialize)]
pub struct NoResponseThresholds {
    #[serde(default = "default_no_response_high_days")]
    pub high_consecutive_days: usize,
    #[serde(default = "default_no_response_high_rate")]
    pub high_min_response_rate: f64,
    #[serde(default = "default_no_response_medium_days")]
    pub medium_consecutive_days: usize,
    #[serde(default = "default_no_response_medium_rate")]
    pub medium_min_response_rate: f64,
}

impl Default for NoResponseThresholds {
    fn default() -> Self {
        Self {
            high_consecutive_days: default_no_response_high_days(),
            high_min_response_rate: default_no_response_high_rate(),
            medium_consecutive_days: default_no_response_medium_days(),
            medium_min_response_rate: default_no_response_medium_rate(),
        }
    }
}

fn default_no_response_high_days() -> usize { 2 }
fn default_no_response_high_rate() -> f64 { 0.3 }
fn default_no_response_medium_days() -> usize { 1 }
fn default_no_response_medium_rate() -> f64 { 0.5 }

/// 关键词列表
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordSettings {
    #[serde(default = "default_emergency_keywords")]
    pub emergency: Vec<String>,
    #[serde(default = "default_warning_keywords")]
    pub warning: Vec<String>,
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            emergency: default_emergency_keywords(),
            warning: default_warning_keywords(),
        }
    }
}

fn default_emergency_keywords() -> Vec<String> {
    ["도와주세요", "아파요", "숨이", "가슴이", "쓰러짐", "응급실", "119", "병원", "죽겠어"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_warning_keywords() -> Vec<String> {
    ["우울해", "외로워", "죽고싶어", "포기", "희망없어", "의미없어", "괴로워", "힘들어"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// 通知管道配置
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,
    #[serde(default = "default_true")]
    pub history_enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            retry: RetrySettings::default(),
            fallback_enabled: true,
            history_enabled: true,
        }
    }
}

/// 重试退避：第 n 次重试前等待 `initial_delay_ms * multiplier^(n-1)`，不超过 `max_delay_ms`
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl RetrySettings {
    /// 第 `retry` 次重试（从 1 开始）前的等待毫秒数
    pub fn delay_ms(&self, retry: u32) -> u64 {
        let exponent = retry.saturating_sub(1) as i32;
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        if delay.is_finite() {
            (delay as u64).min(self.max_delay_ms)
        } else {
            self.max_delay_ms
        }
    }
}

fn default_max_attempts() -> u32 { 3 }
fn default_initial_delay() -> u64 { 1000 }
fn default_multiplier() -> f64 { 2.0 }
fn default_max_delay() -> u64 { 4000 }
fn default_true() -> bool { true }

impl Settings {
    /// 从配置文件和环境变量加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // 环境变量覆盖，前缀 CAREWATCH，分隔符 __
            .add_source(
                Environment::with_prefix("CAREWATCH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// 获取数据库连接 URL（从环境变量）
    pub fn database_url() -> Result<SecretString, ConfigError> {
        env::var("DATABASE_URL")
            .map(SecretString::new)
            .map_err(|_| ConfigError::NotFound("DATABASE_URL".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_defaults_without_files() {
        env::remove_var("CAREWATCH_ALERT__ANALYSIS_DAYS");
        let settings = Settings::load().unwrap();
        assert_eq!(settings.alert.analysis_days, 7);
        assert_eq!(settings.notification.retry.max_attempts, 3);
        assert!(settings.notification.fallback_enabled);
        assert_eq!(settings.alert.keyword.emergency.len(), 9);
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("CAREWATCH_ALERT__ANALYSIS_DAYS", "14");
        let settings = Settings::load().unwrap();
        env::remove_var("CAREWATCH_ALERT__ANALYSIS_DAYS");
        assert_eq!(settings.alert.analysis_days, 14);
    }

    #[test]
    fn test_retry_delay_schedule() {
        let retry = RetrySettings::default();
        assert_eq!(retry.delay_ms(1), 1000);
        assert_eq!(retry.delay_ms(2), 2000);
        assert_eq!(retry.delay_ms(3), 4000);
        assert_eq!(retry.delay_ms(4), 4000);
    }

    #[test]
    fn test_render_title() {
        let alert = AlertSettings::default();
        assert_eq!(alert.render_title("긴급"), "[케어워치 알림] 긴급 단계 이상징후 감지");
    }
}
