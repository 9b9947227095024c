//! 异常分析上下文与结果模型

use crate::models::{AlertLevel, AlertType, ConversationMessage};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 情绪趋势统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionTrend {
    pub total_messages: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    /// 最长连续负面消息数
    pub consecutive_negative_count: usize,
    pub negative_ratio: f64,
}

/// 回应模式统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePattern {
    pub total_check_days: usize,
    pub response_days: usize,
    pub no_response_days: usize,
    /// 从最近一条记录向前数的连续未回应天数
    pub consecutive_no_response_days: usize,
    pub response_rate: f64,
}

/// 关键词类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeywordKind {
    Emergency,
    Warning,
}

/// 关键词命中信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub matched_keyword: String,
    pub original_message: String,
    pub kind: KeywordKind,
}

/// 分析器特有的明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "detail_type", rename_all = "snake_case")]
pub enum AnalysisDetails {
    EmotionTrend(EmotionTrend),
    ResponsePattern(ResponsePattern),
    KeywordMatch(KeywordMatch),
}

/// 单次分析结果（用后即弃）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertResult {
    pub detected: bool,
    pub alert_type: Option<AlertType>,
    pub alert_level: Option<AlertLevel>,
    pub message: Option<String>,
    /// 触发该结果的规则，实时关键词检测时为空
    pub rule_id: Option<Uuid>,
    pub details: Option<AnalysisDetails>,
}

impl AlertResult {
    /// 创建预警结果
    pub fn alert(
        alert_level: AlertLevel,
        alert_type: AlertType,
        message: impl Into<String>,
        details: AnalysisDetails,
    ) -> Self {
        Self {
            detected: true,
            alert_type: Some(alert_type),
            alert_level: Some(alert_level),
            message: Some(message.into()),
            rule_id: None,
            details: Some(details),
        }
    }

    /// 无预警
    pub fn no_alert() -> Self {
        Self {
            detected: false,
            alert_type: None,
            alert_level: None,
            message: None,
            rule_id: None,
            details: None,
        }
    }

    /// 绑定来源规则
    pub fn with_rule(mut self, rule_id: Uuid) -> Self {
        self.rule_id = Some(rule_id);
        self
    }

    pub fn matched_keyword(&self) -> Option<&str> {
        match &self.details {
            Some(AnalysisDetails::KeywordMatch(m)) => Some(m.matched_keyword.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for AlertResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.detected, self.alert_level, self.message.as_deref()) {
            (true, Some(level), Some(message)) => {
                write!(f, "AlertResult{{level={}, message='{}'}}", level, message)
            }
            _ => f.write_str("AlertResult{no alert}"),
        }
    }
}

/// 分析上下文，不同分析器需要的输入不同
#[derive(Debug, Clone)]
pub enum AnalysisContext {
    /// 回看窗口（天）
    Window { days: u32 },
    /// 实时检测的单条消息
    Message(ConversationMessage),
}

impl AnalysisContext {
    pub fn for_emotion_pattern(days: u32) -> Self {
        AnalysisContext::Window { days }
    }

    pub fn for_no_response(days: u32) -> Self {
        AnalysisContext::Window { days }
    }

    pub fn for_keyword(message: ConversationMessage) -> Self {
        AnalysisContext::Message(message)
    }

    /// 按预警类型构建窗口型上下文
    pub fn for_type(alert_type: AlertType, days: u32) -> Self {
        match alert_type {
            AlertType::EmotionPattern => Self::for_emotion_pattern(days),
            AlertType::NoResponse => Self::for_no_response(days),
            _ => AnalysisContext::Window { days },
        }
    }

    pub fn window_days(&self) -> Option<u32> {
        match self {
            AnalysisContext::Window { days } => Some(*days),
            AnalysisContext::Message(_) => None,
        }
    }

    pub fn target_message(&self) -> Option<&ConversationMessage> {
        match self {
            AnalysisContext::Message(message) => Some(message),
            AnalysisContext::Window { .. } => None,
        }
    }
}
