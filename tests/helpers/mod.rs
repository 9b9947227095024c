//! 测试辅助工具

#![allow(dead_code)]

use carewatch::config::{NotificationSettings, RetrySettings, Settings};
use carewatch::models::{ConversationMessage, DailyCheckRecord, EmotionType, Guardian, Subject};
use chrono::{Duration, Utc};
use uuid::Uuid;

/// 生成固定的测试 UUID（用于可重复测试）
pub fn fixed_uuid(seed: u8) -> Uuid {
    Uuid::from_bytes([seed, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, seed])
}

/// 有监护人且已注册推送令牌的对象
pub fn subject_with_guardian(seed: u8) -> Subject {
    Subject {
        id: fixed_uuid(seed),
        name: format!("어르신-{}", seed),
        guardian: Some(Guardian {
            id: fixed_uuid(seed.wrapping_add(100)),
            name: format!("보호자-{}", seed),
            push_token: Some(format!("push-token-{}", seed)),
        }),
    }
}

pub fn subject_without_guardian(seed: u8) -> Subject {
    Subject {
        id: fixed_uuid(seed),
        name: format!("어르신-{}", seed),
        guardian: None,
    }
}

/// 按时间顺序生成消息
pub fn messages(subject_id: Uuid, emotions: &[EmotionType]) -> Vec<ConversationMessage> {
    let start = Utc::now() - Duration::hours(emotions.len() as i64);
    emotions
        .iter()
        .enumerate()
        .map(|(i, emotion)| {
            let mut message = ConversationMessage::new(subject_id, "오늘 하루 어땠어요", *emotion);
            message.created_at = start + Duration::hours(i as i64);
            message
        })
        .collect()
}

/// 从今天起倒序生成每日问候记录，`results[0]` 为今天
pub fn check_ins(subject_id: Uuid, results: &[bool]) -> Vec<DailyCheckRecord> {
    let today = Utc::now().date_naive();
    results
        .iter()
        .enumerate()
        .map(|(i, success)| DailyCheckRecord {
            subject_id,
            check_date: today - Duration::days(i as i64),
            success: *success,
        })
        .collect()
}

/// 毫秒级退避的通知配置
pub fn fast_notification_settings() -> NotificationSettings {
    NotificationSettings {
        retry: RetrySettings {
            max_attempts: 3,
            initial_delay_ms: 1,
            multiplier: 2.0,
            max_delay_ms: 4,
        },
        ..NotificationSettings::default()
    }
}

pub fn fast_settings() -> Settings {
    Settings {
        notification: fast_notification_settings(),
        ..Settings::default()
    }
}
