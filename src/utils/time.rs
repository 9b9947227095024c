//! 时间处理工具

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// 获取 N 天前的时间
pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

/// 所在日期的 UTC 0 点，用作预警去重日期
pub fn day_bucket(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}

/// 回看窗口 `[today - days, today]` 的起止日期
pub fn date_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(i64::from(days)), today)
}

/// 比率转百分比（保留一位小数的显示值）
pub fn percent(ratio: f64) -> f64 {
    (ratio * 1000.0).round() / 10.0
}
