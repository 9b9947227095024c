//! 无回应分析器

use super::AnomalyAnalyzer;
use crate::config::NoResponseThresholds;
use crate::errors::AppError;
use crate::models::{
    AlertLevel, AlertResult, AlertType, AnalysisContext, AnalysisDetails, DailyCheckRecord,
    ResponsePattern, Subject,
};
use crate::services::CheckInProvider;
use crate::utils::{date_window, percent};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// 每日问候无回应分析
pub struct NoResponseAnalyzer {
    check_ins: Arc<dyn CheckInProvider>,
    thresholds: NoResponseThresholds,
}

impl NoResponseAnalyzer {
    pub fn new(check_ins: Arc<dyn CheckInProvider>, thresholds: NoResponseThresholds) -> Self {
        Self { check_ins, thresholds }
    }

    /// 统计回应模式，`records` 需按日期倒序
    pub fn response_pattern(records: &[DailyCheckRecord]) -> ResponsePattern {
        let total = records.len();
        let responded = records.iter().filter(|r| r.success).count();
        let streak = records.iter().take_while(|r| !r.success).count();
        let response_rate = if total == 0 {
            0.0
        } else {
            responded as f64 / total as f64
        };

        ResponsePattern {
            total_check_days: total,
            response_days: responded,
            no_response_days: total - responded,
            consecutive_no_response_days: streak,
            response_rate,
        }
    }

    fn evaluate(&self, pattern: ResponsePattern) -> AlertResult {
        let streak = pattern.consecutive_no_response_days;
        let rate = pattern.response_rate;
        let t = &self.thresholds;

        let level = if streak >= t.high_consecutive_days || rate < t.high_min_response_rate {
            AlertLevel::High
        } else if streak >= t.medium_consecutive_days || rate < t.medium_min_response_rate {
            AlertLevel::Medium
        } else {
            return AlertResult::no_alert();
        };

        let message = format!(
            "{}일 연속 무응답 감지 (무응답비율: {:.1}%)",
            streak,
            percent(1.0 - rate)
        );
        AlertResult::alert(
            level,
            AlertType::NoResponse,
            message,
            AnalysisDetails::ResponsePattern(pattern),
        )
    }
}

#[async_trait]
impl AnomalyAnalyzer for NoResponseAnalyzer {
    async fn analyze(&self, subject: &Subject, context: &AnalysisContext) -> Result<AlertResult, AppError> {
        let Some(days) = context.window_days() else {
            return Ok(AlertResult::no_alert());
        };

        let (from, to) = date_window(Utc::now().date_naive(), days);
        let mut records = self.check_ins.recent_check_ins(subject.id, from, to).await?;
        if records.is_empty() {
            return Ok(AlertResult::no_alert());
        }

        records.sort_by(|a, b| b.check_date.cmp(&a.check_date));
        let pattern = Self::response_pattern(&records);
        tracing::debug!(
            subject_id = %subject.id,
            total = pattern.total_check_days,
            streak = pattern.consecutive_no_response_days,
            rate = pattern.response_rate,
            "回应模式统计完成"
        );

        Ok(self.evaluate(pattern))
    }

    fn supported_type(&self) -> AlertType {
        AlertType::NoResponse
    }

    fn name(&self) -> &'static str {
        "NoResponseAnalyzer"
    }
}
