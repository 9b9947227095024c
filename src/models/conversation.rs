//! 对话消息与每日问候记录模型

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 消息情绪分类
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "emotion_type", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmotionType {
    Positive,
    Negative,
    Neutral,
}

impl EmotionType {
    pub fn is_negative(&self) -> bool {
        matches!(self, EmotionType::Negative)
    }
}

/// 被监护对象发出的对话消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub content: String,
    pub emotion: EmotionType,
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(subject_id: Uuid, content: impl Into<String>, emotion: EmotionType) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject_id,
            content: content.into(),
            emotion,
            created_at: Utc::now(),
        }
    }
}

/// 每日问候（签到）记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyCheckRecord {
    pub subject_id: Uuid,
    pub check_date: NaiveDate,
    /// 对象是否在当天做出回应
    pub success: bool,
}

/// 最长连续负面情绪消息数
///
/// 遇到任何非负面消息即清零，取扫描过程中的最大值。
pub fn longest_negative_run(messages: &[ConversationMessage]) -> usize {
    let mut longest = 0;
    let mut current = 0;

    for message in messages {
        if message.emotion.is_negative() {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }

    longest
}

/// 负面情绪消息占比，空列表为 0.0
pub fn negative_ratio(messages: &[ConversationMessage]) -> f64 {
    if messages.is_empty() {
        return 0.0;
    }
    let negatives = messages.iter().filter(|m| m.emotion.is_negative()).count();
    negatives as f64 / messages.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(emotions: &[EmotionType]) -> Vec<ConversationMessage> {
        let subject_id = Uuid::new_v4();
        emotions
            .iter()
            .map(|e| ConversationMessage::new(subject_id, "안녕하세요", *e))
            .collect()
    }

    use EmotionType::{Negative as N, Neutral as U, Positive as P};

    #[test]
    fn test_longest_negative_run_resets_on_non_negative() {
        assert_eq!(longest_negative_run(&messages(&[N, N, P, N])), 2);
        assert_eq!(longest_negative_run(&messages(&[N, U, N, N, N])), 3);
        assert_eq!(longest_negative_run(&messages(&[P, U, P])), 0);
    }

    #[test]
    fn test_longest_negative_run_counts_trailing_run() {
        assert_eq!(longest_negative_run(&messages(&[P, N, N, N, N])), 4);
    }

    #[test]
    fn test_longest_negative_run_empty() {
        assert_eq!(longest_negative_run(&[]), 0);
    }

    #[test]
    fn test_negative_ratio() {
        assert_eq!(negative_ratio(&[]), 0.0);
        let ratio = negative_ratio(&messages(&[N, P, N, U]));
        assert!((ratio - 0.5).abs() < f64::EPSILON);
    }
}
