//! 预警历史模型

use crate::models::{AlertLevel, AlertType};
use crate::utils::day_bucket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 发送失败结果前缀
pub const FAILED_RESULT_PREFIX: &str = "FAILED: ";

/// 对象没有监护人，无需通知
pub const NO_GUARDIAN_RESULT: &str = "NO_GUARDIAN";

/// 预警历史记录
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AlertHistory {
    pub id: Uuid,
    /// 来源规则，临时预警为空
    pub rule_id: Option<Uuid>,
    pub subject_id: Uuid,
    pub alert_type: AlertType,
    pub alert_level: AlertLevel,
    pub alert_message: String,
    /// 检测明细（JSON）
    pub detection_details: Option<String>,
    pub notification_sent: bool,
    pub notification_sent_at: Option<DateTime<Utc>>,
    pub notification_result: Option<String>,
    /// 去重日期：按天记录为当天 0 点，紧急/关键词预警为精确时间
    pub alert_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AlertHistory {
    /// 标记通知已发送
    pub fn mark_sent(&mut self, result: impl Into<String>) {
        self.notification_sent = true;
        self.notification_sent_at = Some(Utc::now());
        self.notification_result = Some(result.into());
    }

    /// 标记通知发送失败
    pub fn mark_failed(&mut self, reason: &str) {
        self.notification_sent = false;
        self.notification_result = Some(format!("{}{}", FAILED_RESULT_PREFIX, reason));
    }

    /// 标记无需通知（没有监护人），不会进入待重发队列
    pub fn mark_no_guardian(&mut self) {
        self.notification_sent = false;
        self.notification_sent_at = None;
        self.notification_result = Some(NO_GUARDIAN_RESULT.to_string());
    }

    /// 是否计入通知送达率（无监护人的记录不计）
    pub fn expects_notification(&self) -> bool {
        self.notification_result.as_deref() != Some(NO_GUARDIAN_RESULT)
    }

    /// 是否可以重新发送通知
    pub fn can_retry_notification(&self) -> bool {
        !self.notification_sent
            && self
                .notification_result
                .as_deref()
                .map_or(true, |r| r.starts_with(FAILED_RESULT_PREFIX))
    }

    pub fn dedup_key(&self) -> AlertDedupKey {
        AlertDedupKey {
            subject_id: self.subject_id,
            rule_id: self.rule_id,
            alert_type: self.alert_type,
            alert_date: self.alert_date,
        }
    }
}

/// 去重键：(对象, 规则, 类型, 日期)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlertDedupKey {
    pub subject_id: Uuid,
    pub rule_id: Option<Uuid>,
    pub alert_type: AlertType,
    pub alert_date: DateTime<Utc>,
}

/// 待写入的预警历史
#[derive(Debug, Clone)]
pub struct NewAlertHistory {
    pub rule_id: Option<Uuid>,
    pub subject_id: Uuid,
    pub alert_type: AlertType,
    pub alert_level: AlertLevel,
    pub alert_message: String,
    pub detection_details: Option<String>,
    pub alert_date: DateTime<Utc>,
}

impl NewAlertHistory {
    /// 构建预警历史，`now` 决定去重日期
    ///
    /// 关键词与紧急预警使用精确时间（同日可多次记录），其余按天去重。
    pub fn new(
        subject_id: Uuid,
        rule_id: Option<Uuid>,
        alert_type: AlertType,
        alert_level: AlertLevel,
        alert_message: String,
        detection_details: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let alert_date = if Self::is_day_bucketed(alert_type, alert_level) {
            day_bucket(now)
        } else {
            now
        };

        Self {
            rule_id,
            subject_id,
            alert_type,
            alert_level,
            alert_message,
            detection_details,
            alert_date,
        }
    }

    pub fn is_day_bucketed(alert_type: AlertType, alert_level: AlertLevel) -> bool {
        alert_type != AlertType::KeywordDetection && !alert_level.is_emergency()
    }

    pub fn dedup_key(&self) -> AlertDedupKey {
        AlertDedupKey {
            subject_id: self.subject_id,
            rule_id: self.rule_id,
            alert_type: self.alert_type,
            alert_date: self.alert_date,
        }
    }

    /// 转换为完整记录（内存存储使用）
    pub fn into_history(self, id: Uuid, created_at: DateTime<Utc>) -> AlertHistory {
        AlertHistory {
            id,
            rule_id: self.rule_id,
            subject_id: self.subject_id,
            alert_type: self.alert_type,
            alert_level: self.alert_level,
            alert_message: self.alert_message,
            detection_details: self.detection_details,
            notification_sent: false,
            notification_sent_at: None,
            notification_result: None,
            alert_date: self.alert_date,
            created_at,
        }
    }
}

/// 原子插入结果
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted(AlertHistory),
    /// 同一去重键已存在，返回已有记录
    Duplicate(AlertHistory),
}

impl InsertOutcome {
    pub fn history(&self) -> &AlertHistory {
        match self {
            InsertOutcome::Inserted(h) | InsertOutcome::Duplicate(h) => h,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, InsertOutcome::Duplicate(_))
    }
}
