//! 情绪模式分析器

use super::AnomalyAnalyzer;
use crate::config::EmotionThresholds;
use crate::errors::AppError;
use crate::models::{
    longest_negative_run, negative_ratio, AlertLevel, AlertResult, AlertType, AnalysisContext,
    AnalysisDetails, ConversationMessage, EmotionTrend, EmotionType, Subject,
};
use crate::services::MessageProvider;
use crate::utils::percent;
use async_trait::async_trait;
use std::sync::Arc;

/// 连续负面情绪分析
pub struct EmotionPatternAnalyzer {
    messages: Arc<dyn MessageProvider>,
    thresholds: EmotionThresholds,
}

impl EmotionPatternAnalyzer {
    pub fn new(messages: Arc<dyn MessageProvider>, thresholds: EmotionThresholds) -> Self {
        Self { messages, thresholds }
    }

    /// 统计情绪趋势
    pub fn emotion_trend(messages: &[ConversationMessage]) -> EmotionTrend {
        let count = |emotion: EmotionType| messages.iter().filter(|m| m.emotion == emotion).count();

        EmotionTrend {
            total_messages: messages.len(),
            positive_count: count(EmotionType::Positive),
            negative_count: count(EmotionType::Negative),
            neutral_count: count(EmotionType::Neutral),
            consecutive_negative_count: longest_negative_run(messages),
            negative_ratio: negative_ratio(messages),
        }
    }

    fn evaluate(&self, trend: EmotionTrend) -> AlertResult {
        let run = trend.consecutive_negative_count;
        let ratio = trend.negative_ratio;

        let level = if run >= self.thresholds.high_consecutive && ratio >= self.thresholds.high_ratio {
            AlertLevel::High
        } else if run >= self.thresholds.medium_consecutive && ratio >= self.thresholds.medium_ratio {
            AlertLevel::Medium
        } else {
            return AlertResult::no_alert();
        };

        let message = format!("{}일 연속 부정감정 감지 (부정감정비율: {:.1}%)", run, percent(ratio));
        AlertResult::alert(
            level,
            AlertType::EmotionPattern,
            message,
            AnalysisDetails::EmotionTrend(trend),
        )
    }
}

#[async_trait]
impl AnomalyAnalyzer for EmotionPatternAnalyzer {
    async fn analyze(&self, subject: &Subject, context: &AnalysisContext) -> Result<AlertResult, AppError> {
        let Some(days) = context.window_days() else {
            return Ok(AlertResult::no_alert());
        };

        let messages = self.messages.recent_messages(subject.id, days).await?;
        if messages.is_empty() {
            return Ok(AlertResult::no_alert());
        }

        let trend = Self::emotion_trend(&messages);
        tracing::debug!(
            subject_id = %subject.id,
            total = trend.total_messages,
            run = trend.consecutive_negative_count,
            ratio = trend.negative_ratio,
            "情绪趋势统计完成"
        );

        Ok(self.evaluate(trend))
    }

    fn supported_type(&self) -> AlertType {
        AlertType::EmotionPattern
    }

    fn name(&self) -> &'static str {
        "EmotionPatternAnalyzer"
    }
}
