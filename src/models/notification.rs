//! 通知模型

use crate::models::AlertType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// 通知渠道
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "notification_channel", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationChannelType {
    Push,
    Email,
    Sms,
    InApp,
}

impl fmt::Display for NotificationChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationChannelType::Push => write!(f, "PUSH"),
            NotificationChannelType::Email => write!(f, "EMAIL"),
            NotificationChannelType::Sms => write!(f, "SMS"),
            NotificationChannelType::InApp => write!(f, "IN_APP"),
        }
    }
}

/// 通知业务类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    EmotionAlert,
    NoResponseAlert,
    KeywordAlert,
    System,
}

impl NotificationType {
    /// 预警类型对应的通知类型
    pub fn from_alert_type(alert_type: AlertType) -> Self {
        match alert_type {
            AlertType::EmotionPattern => NotificationType::EmotionAlert,
            AlertType::NoResponse => NotificationType::NoResponseAlert,
            AlertType::KeywordDetection => NotificationType::KeywordAlert,
            AlertType::HealthConcern | AlertType::Emergency => NotificationType::System,
        }
    }
}

/// 通知来源
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "notification_source", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationSourceType {
    AlertRule,
    DailyCheck,
    ManualAlert,
    System,
}

/// 一次发送请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub recipient_id: Uuid,
    /// 推送令牌，由调用方从监护人信息解析
    pub push_token: Option<String>,
    pub title: String,
    pub body: String,
    pub notification_type: NotificationType,
    pub source_type: NotificationSourceType,
    /// 关联实体（预警历史 ID）
    pub source_entity_id: Option<Uuid>,
}

impl NotificationRequest {
    pub fn new(
        recipient_id: Uuid,
        push_token: Option<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id,
            push_token,
            title: title.into(),
            body: body.into(),
            notification_type: NotificationType::System,
            source_type: NotificationSourceType::System,
            source_entity_id: None,
        }
    }

    pub fn with_source(
        mut self,
        notification_type: NotificationType,
        source_type: NotificationSourceType,
        source_entity_id: Uuid,
    ) -> Self {
        self.notification_type = notification_type;
        self.source_type = source_type;
        self.source_entity_id = Some(source_entity_id);
        self
    }
}

/// 发送回执，`delivered == false` 表示渠道正常返回但未送达
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub delivered: bool,
    pub channel: NotificationChannelType,
    pub message_id: Option<String>,
}

impl DeliveryReceipt {
    pub fn delivered(channel: NotificationChannelType, message_id: Option<String>) -> Self {
        Self {
            delivered: true,
            channel,
            message_id,
        }
    }

    pub fn not_delivered(channel: NotificationChannelType) -> Self {
        Self {
            delivered: false,
            channel,
            message_id: None,
        }
    }
}

/// 通知历史记录（只追加）
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationHistory {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub channel_type: NotificationChannelType,
    pub success: bool,
    pub error_message: Option<String>,
    pub external_message_id: Option<String>,
    pub notification_type: NotificationType,
    pub source_type: NotificationSourceType,
    pub source_entity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// 待写入的通知历史
#[derive(Debug, Clone)]
pub struct NewNotificationHistory {
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub channel_type: NotificationChannelType,
    pub success: bool,
    pub error_message: Option<String>,
    pub external_message_id: Option<String>,
    pub notification_type: NotificationType,
    pub source_type: NotificationSourceType,
    pub source_entity_id: Option<Uuid>,
}

impl NewNotificationHistory {
    pub fn success(
        request: &NotificationRequest,
        channel_type: NotificationChannelType,
        external_message_id: Option<String>,
    ) -> Self {
        Self::from_request(request, channel_type, true, None, external_message_id)
    }

    pub fn failure(
        request: &NotificationRequest,
        channel_type: NotificationChannelType,
        error_message: impl Into<String>,
    ) -> Self {
        Self::from_request(request, channel_type, false, Some(error_message.into()), None)
    }

    fn from_request(
        request: &NotificationRequest,
        channel_type: NotificationChannelType,
        success: bool,
        error_message: Option<String>,
        external_message_id: Option<String>,
    ) -> Self {
        Self {
            recipient_id: request.recipient_id,
            title: request.title.clone(),
            message: request.body.clone(),
            channel_type,
            success,
            error_message,
            external_message_id,
            notification_type: request.notification_type,
            source_type: request.source_type,
            source_entity_id: request.source_entity_id,
        }
    }

    pub fn into_history(self, id: Uuid, created_at: DateTime<Utc>) -> NotificationHistory {
        NotificationHistory {
            id,
            recipient_id: self.recipient_id,
            title: self.title,
            message: self.message,
            channel_type: self.channel_type,
            success: self.success,
            error_message: self.error_message,
            external_message_id: self.external_message_id,
            notification_type: self.notification_type,
            source_type: self.source_type,
            source_entity_id: self.source_entity_id,
            created_at,
        }
    }
}

/// 通知统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationStatistics {
    pub total_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub success_rate: f64,
    pub failure_rate: f64,
}

impl NotificationStatistics {
    pub fn of(total_count: u64, success_count: u64) -> Self {
        let failure_count = total_count.saturating_sub(success_count);
        let (success_rate, failure_rate) = if total_count == 0 {
            (0.0, 0.0)
        } else {
            (
                success_count as f64 / total_count as f64,
                failure_count as f64 / total_count as f64,
            )
        };

        Self {
            total_count,
            success_count,
            failure_count,
            success_rate,
            failure_rate,
        }
    }

    pub fn success_percentage(&self) -> f64 {
        self.success_rate * 100.0
    }

    pub fn failure_percentage(&self) -> f64 {
        self.failure_rate * 100.0
    }

    pub fn summary(&self) -> String {
        format!(
            "전체: {}건, 성공: {}건({:.1}%), 실패: {}건({:.1}%)",
            self.total_count,
            self.success_count,
            self.success_percentage(),
            self.failure_count,
            self.failure_percentage()
        )
    }
}
