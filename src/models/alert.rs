//! 预警规则模型

use crate::models::{longest_negative_run, ConversationMessage, EmotionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// 预警级别（LOW < MEDIUM < HIGH < EMERGENCY）
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[sqlx(type_name = "alert_level", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Low,
    Medium,
    High,
    Emergency,
}

impl AlertLevel {
    /// 数值越大越紧急
    pub fn priority(&self) -> u8 {
        match self {
            AlertLevel::Low => 1,
            AlertLevel::Medium => 2,
            AlertLevel::High => 3,
            AlertLevel::Emergency => 4,
        }
    }

    pub fn is_emergency(&self) -> bool {
        matches!(self, AlertLevel::Emergency)
    }

    pub fn is_higher_or_equal(&self, other: &AlertLevel) -> bool {
        self.priority() >= other.priority()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Low => "LOW",
            AlertLevel::Medium => "MEDIUM",
            AlertLevel::High => "HIGH",
            AlertLevel::Emergency => "EMERGENCY",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 预警类型
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[sqlx(type_name = "alert_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    /// 连续负面情绪
    EmotionPattern,
    /// 一段时间内无回应
    NoResponse,
    /// 消息中含危险关键词
    KeywordDetection,
    /// 健康相关担忧
    HealthConcern,
    /// 需要立即处理的紧急情况
    Emergency,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertType::EmotionPattern => "EMOTION_PATTERN",
            AlertType::NoResponse => "NO_RESPONSE",
            AlertType::KeywordDetection => "KEYWORD_DETECTION",
            AlertType::HealthConcern => "HEALTH_CONCERN",
            AlertType::Emergency => "EMERGENCY",
        };
        f.write_str(s)
    }
}

/// 预警条件（嵌入在规则中，含义随预警类型变化）
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, PartialEq)]
pub struct AlertCondition {
    /// 连续天数（情绪模式、无回应使用）
    pub consecutive_days: Option<i32>,
    /// 阈值次数
    pub threshold_count: Option<i32>,
    /// 目标情绪
    pub target_emotion: Option<EmotionType>,
    /// 关键词列表（逗号分隔）
    pub keywords: Option<String>,
}

impl AlertCondition {
    /// 情绪模式条件
    pub fn emotion(consecutive_days: i32) -> Self {
        Self {
            consecutive_days: Some(consecutive_days),
            threshold_count: Some(1),
            target_emotion: Some(EmotionType::Negative),
            keywords: None,
        }
    }

    /// 无回应条件
    pub fn no_response(no_response_days: i32) -> Self {
        Self {
            consecutive_days: Some(no_response_days),
            threshold_count: Some(0),
            target_emotion: None,
            keywords: None,
        }
    }

    /// 关键词条件
    pub fn keyword(keywords: impl Into<String>) -> Self {
        Self {
            consecutive_days: None,
            threshold_count: Some(1),
            target_emotion: None,
            keywords: Some(keywords.into()),
        }
    }

    /// 评估一组最近消息是否满足条件
    ///
    /// 缺失字段或不支持的类型一律视为不满足，不会返回错误。
    pub fn evaluate(&self, messages: &[ConversationMessage], alert_type: AlertType) -> bool {
        match alert_type {
            AlertType::EmotionPattern => self.evaluate_emotion_pattern(messages),
            AlertType::NoResponse => self.evaluate_no_response(messages),
            AlertType::KeywordDetection => self.evaluate_keywords(messages),
            _ => false,
        }
    }

    fn evaluate_emotion_pattern(&self, messages: &[ConversationMessage]) -> bool {
        let required = match self.consecutive_days {
            Some(days) if days > 0 => days as usize,
            _ => return false,
        };
        if messages.is_empty() {
            return false;
        }
        longest_negative_run(messages) >= required
    }

    fn evaluate_no_response(&self, messages: &[ConversationMessage]) -> bool {
        match self.consecutive_days {
            Some(expected) if expected > 0 => messages.len() < expected as usize,
            _ => false,
        }
    }

    fn evaluate_keywords(&self, messages: &[ConversationMessage]) -> bool {
        let keywords = self.keyword_list();
        if keywords.is_empty() {
            return false;
        }

        messages.iter().any(|message| {
            let content = message.content.to_lowercase();
            keywords.iter().any(|keyword| content.contains(keyword.as_str()))
        })
    }

    /// 解析后的小写关键词，忽略空项
    pub fn keyword_list(&self) -> Vec<String> {
        self.keywords
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// 预警规则
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AlertRule {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub alert_type: AlertType,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(flatten)]
    pub condition: AlertCondition,
    pub alert_level: AlertLevel,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AlertRule {
    fn build(
        subject_id: Uuid,
        alert_type: AlertType,
        name: &str,
        description: String,
        condition: AlertCondition,
        alert_level: AlertLevel,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            subject_id,
            alert_type,
            name: name.to_string(),
            description: Some(description),
            condition,
            alert_level,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// 连续负面情绪规则
    pub fn emotion_pattern(subject_id: Uuid, consecutive_days: i32, level: AlertLevel) -> Self {
        Self::build(
            subject_id,
            AlertType::EmotionPattern,
            "연속 부정감정 감지",
            format!("{}일 연속 부정적 감정 감지 시 알림", consecutive_days),
            AlertCondition::emotion(consecutive_days),
            level,
        )
    }

    /// 无回应规则
    pub fn no_response(subject_id: Uuid, no_response_days: i32, level: AlertLevel) -> Self {
        Self::build(
            subject_id,
            AlertType::NoResponse,
            "무응답 감지",
            format!("{}일 연속 무응답 시 알림", no_response_days),
            AlertCondition::no_response(no_response_days),
            level,
        )
    }

    /// 关键词规则
    pub fn keyword(subject_id: Uuid, keywords: &str, level: AlertLevel) -> Self {
        Self::build(
            subject_id,
            AlertType::KeywordDetection,
            "키워드 감지",
            format!("위험 키워드 감지 시 알림: {}", keywords),
            AlertCondition::keyword(keywords),
            level,
        )
    }

    /// 规则是否应触发（停用规则永不触发）
    pub fn should_trigger(&self, recent_messages: &[ConversationMessage]) -> bool {
        self.active && self.condition.evaluate(recent_messages, self.alert_type)
    }

    /// 条件字段是否与预警类型匹配
    pub fn matches_condition_shape(&self) -> bool {
        match self.alert_type {
            AlertType::EmotionPattern | AlertType::NoResponse => {
                self.condition.consecutive_days.is_some_and(|d| d > 0)
            }
            AlertType::KeywordDetection => !self.condition.keyword_list().is_empty(),
            AlertType::HealthConcern | AlertType::Emergency => true,
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }

    pub fn update(&mut self, name: String, description: Option<String>, alert_level: AlertLevel) {
        self.name = name;
        self.description = description;
        self.alert_level = alert_level;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EmotionType::{Negative as N, Positive as P};

    fn messages(emotions: &[EmotionType]) -> Vec<ConversationMessage> {
        let subject_id = Uuid::new_v4();
        emotions
            .iter()
            .map(|e| ConversationMessage::new(subject_id, "오늘은 그냥 그래요", *e))
            .collect()
    }

    fn texts(contents: &[&str]) -> Vec<ConversationMessage> {
        let subject_id = Uuid::new_v4();
        contents
            .iter()
            .map(|c| ConversationMessage::new(subject_id, *c, EmotionType::Neutral))
            .collect()
    }

    #[test]
    fn test_alert_level_ordering() {
        assert!(AlertLevel::Low < AlertLevel::Medium);
        assert!(AlertLevel::Medium < AlertLevel::High);
        assert!(AlertLevel::High < AlertLevel::Emergency);
        assert!(AlertLevel::Emergency.is_higher_or_equal(&AlertLevel::High));
        assert!(!AlertLevel::Low.is_higher_or_equal(&AlertLevel::Medium));
        assert!(AlertLevel::Emergency.is_emergency());
    }

    #[test]
    fn test_emotion_condition() {
        let condition = AlertCondition::emotion(3);
        assert!(condition.evaluate(&messages(&[N, N, N]), AlertType::EmotionPattern));
        assert!(!condition.evaluate(&messages(&[N, P, N]), AlertType::EmotionPattern));
        assert!(condition.evaluate(&messages(&[N, P, N, N, N]), AlertType::EmotionPattern));
        assert!(!condition.evaluate(&[], AlertType::EmotionPattern));
    }

    #[test]
    fn test_emotion_condition_missing_days_is_not_satisfied() {
        let condition = AlertCondition::default();
        assert!(!condition.evaluate(&messages(&[N, N, N, N]), AlertType::EmotionPattern));
    }

    #[test]
    fn test_no_response_condition() {
        let condition = AlertCondition::no_response(3);
        assert!(condition.evaluate(&messages(&[P, P]), AlertType::NoResponse));
        assert!(!condition.evaluate(&messages(&[P, P, P]), AlertType::NoResponse));
        assert!(!AlertCondition::default().evaluate(&[], AlertType::NoResponse));
    }

    #[test]
    fn test_keyword_condition_is_case_insensitive() {
        let condition = AlertCondition::keyword("Help, 아파요 ,");
        assert!(condition.evaluate(&texts(&["please HELP me"]), AlertType::KeywordDetection));
        assert!(condition.evaluate(&texts(&["괜찮아요", "정말 아파요"]), AlertType::KeywordDetection));
        assert!(!condition.evaluate(&texts(&["좋은 아침"]), AlertType::KeywordDetection));
    }

    #[test]
    fn test_keyword_condition_blank_list() {
        let condition = AlertCondition::keyword("  , ,");
        assert!(condition.keyword_list().is_empty());
        assert!(!condition.evaluate(&texts(&["아무 말"]), AlertType::KeywordDetection));
    }

    #[test]
    fn test_unsupported_type_is_not_satisfied() {
        let condition = AlertCondition::emotion(1);
        assert!(!condition.evaluate(&messages(&[N]), AlertType::HealthConcern));
    }

    #[test]
    fn test_rule_lifecycle() {
        let mut rule = AlertRule::emotion_pattern(Uuid::new_v4(), 2, AlertLevel::Medium);
        assert!(rule.matches_condition_shape());
        assert!(rule.should_trigger(&messages(&[N, N])));

        rule.deactivate();
        assert!(!rule.should_trigger(&messages(&[N, N])));

        rule.activate();
        rule.update("새 규칙".into(), None, AlertLevel::High);
        assert_eq!(rule.alert_level, AlertLevel::High);
        assert!(rule.should_trigger(&messages(&[N, N])));
    }

    #[test]
    fn test_condition_shape_mismatch() {
        let mut rule = AlertRule::keyword(Uuid::new_v4(), "도와주세요", AlertLevel::High);
        assert!(rule.matches_condition_shape());
        rule.condition = AlertCondition::emotion(3);
        assert!(!rule.matches_condition_shape());
    }
}
