//! 存储抽象
//!
//! 服务层只依赖这些 trait，PostgreSQL 与内存实现可互换。

use crate::errors::AppError;
use crate::models::{
    AlertHistory, AlertRule, InsertOutcome, NewAlertHistory, NewNotificationHistory,
    NotificationHistory,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 预警规则存储
#[async_trait]
pub trait AlertRuleStore: Send + Sync {
    /// 新建或覆盖规则
    async fn save_rule(&self, rule: &AlertRule) -> Result<AlertRule, AppError>;

    async fn find_rule(&self, rule_id: Uuid) -> Result<Option<AlertRule>, AppError>;

    /// 对象的全部启用规则
    async fn find_active_rules(&self, subject_id: Uuid) -> Result<Vec<AlertRule>, AppError>;

    async fn delete_rule(&self, rule_id: Uuid) -> Result<(), AppError>;
}

/// 预警历史存储
#[async_trait]
pub trait AlertHistoryStore: Send + Sync {
    /// 原子地按去重键插入，已存在时返回原记录
    async fn insert_if_absent(&self, history: NewAlertHistory) -> Result<InsertOutcome, AppError>;

    async fn find_history(&self, history_id: Uuid) -> Result<Option<AlertHistory>, AppError>;

    /// `since` 之后创建的记录，按创建时间倒序
    async fn find_recent(
        &self,
        subject_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<AlertHistory>, AppError>;

    /// 写回通知发送结果
    async fn update_notification_status(&self, history: &AlertHistory) -> Result<(), AppError>;

    /// 可重发通知的记录（未发送且结果为空或以 `FAILED: ` 开头）
    async fn find_pending_notifications(&self) -> Result<Vec<AlertHistory>, AppError>;

    /// `since` 之后需要通知的 (总数, 已发送数)，无监护人的记录不计
    async fn count_notifications_since(&self, since: DateTime<Utc>) -> Result<(u64, u64), AppError>;
}

/// 通知历史存储（只追加）
#[async_trait]
pub trait NotificationHistoryStore: Send + Sync {
    async fn append(&self, entry: NewNotificationHistory) -> Result<NotificationHistory, AppError>;

    /// 按创建时间倒序
    async fn find_by_recipient(&self, recipient_id: Uuid) -> Result<Vec<NotificationHistory>, AppError>;

    async fn find_by_recipient_and_success(
        &self,
        recipient_id: Uuid,
        success: bool,
    ) -> Result<Vec<NotificationHistory>, AppError>;

    /// `since` 之后的 (总数, 成功数)
    async fn count_since(&self, since: DateTime<Utc>) -> Result<(u64, u64), AppError>;

    /// 删除 `cutoff` 之前的记录，返回删除条数
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;
}
