//! 内存存储实现
//!
//! 用于嵌入式部署与测试。所有读写都在单个 `Mutex` 守卫内完成，
//! 去重的"检查并插入"因此是原子的。

use crate::errors::AppError;
use crate::models::{
    AlertHistory, AlertRule, InsertOutcome, NewAlertHistory, NewNotificationHistory,
    NotificationHistory,
};
use crate::repositories::{AlertHistoryStore, AlertRuleStore, NotificationHistoryStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::InternalError("内存存储锁已损坏".to_string()))
}

/// 内存预警规则存储
#[derive(Debug, Default, Clone)]
pub struct InMemoryAlertRuleStore {
    rules: Arc<Mutex<HashMap<Uuid, AlertRule>>>,
}

impl InMemoryAlertRuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertRuleStore for InMemoryAlertRuleStore {
    async fn save_rule(&self, rule: &AlertRule) -> Result<AlertRule, AppError> {
        lock(&self.rules)?.insert(rule.id, rule.clone());
        Ok(rule.clone())
    }

    async fn find_rule(&self, rule_id: Uuid) -> Result<Option<AlertRule>, AppError> {
        Ok(lock(&self.rules)?.get(&rule_id).cloned())
    }

    async fn find_active_rules(&self, subject_id: Uuid) -> Result<Vec<AlertRule>, AppError> {
        let mut rules: Vec<AlertRule> = lock(&self.rules)?
            .values()
            .filter(|r| r.subject_id == subject_id && r.active)
            .cloned()
            .collect();
        rules.sort_by_key(|r| r.created_at);
        Ok(rules)
    }

    async fn delete_rule(&self, rule_id: Uuid) -> Result<(), AppError> {
        lock(&self.rules)?
            .remove(&rule_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("预警规则不存在: {}", rule_id)))
    }
}

/// 内存预警历史存储
#[derive(Debug, Default, Clone)]
pub struct InMemoryAlertHistoryStore {
    rows: Arc<Mutex<Vec<AlertHistory>>>,
}

impl InMemoryAlertHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AlertHistoryStore for InMemoryAlertHistoryStore {
    async fn insert_if_absent(&self, history: NewAlertHistory) -> Result<InsertOutcome, AppError> {
        let mut rows = lock(&self.rows)?;
        let key = history.dedup_key();

        if let Some(existing) = rows.iter().find(|row| row.dedup_key() == key) {
            return Ok(InsertOutcome::Duplicate(existing.clone()));
        }

        let row = history.into_history(Uuid::new_v4(), Utc::now());
        rows.push(row.clone());
        Ok(InsertOutcome::Inserted(row))
    }

    async fn find_history(&self, history_id: Uuid) -> Result<Option<AlertHistory>, AppError> {
        Ok(lock(&self.rows)?.iter().find(|r| r.id == history_id).cloned())
    }

    async fn find_recent(
        &self,
        subject_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<AlertHistory>, AppError> {
        let now = Utc::now();
        let mut rows: Vec<AlertHistory> = lock(&self.rows)?
            .iter()
            .filter(|r| r.subject_id == subject_id && r.created_at >= since && r.created_at <= now)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update_notification_status(&self, history: &AlertHistory) -> Result<(), AppError> {
        let mut rows = lock(&self.rows)?;
        let row = rows
            .iter_mut()
            .find(|r| r.id == history.id)
            .ok_or_else(|| AppError::NotFound(format!("预警历史不存在: {}", history.id)))?;

        row.notification_sent = history.notification_sent;
        row.notification_sent_at = history.notification_sent_at;
        row.notification_result = history.notification_result.clone();
        Ok(())
    }

    async fn find_pending_notifications(&self) -> Result<Vec<AlertHistory>, AppError> {
        let mut rows: Vec<AlertHistory> = lock(&self.rows)?
            .iter()
            .filter(|r| r.can_retry_notification())
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    async fn count_notifications_since(&self, since: DateTime<Utc>) -> Result<(u64, u64), AppError> {
        let rows = lock(&self.rows)?;
        let recent = rows
            .iter()
            .filter(|r| r.created_at >= since && r.expects_notification());
        let (total, sent) = recent.fold((0u64, 0u64), |(total, sent), r| {
            (total + 1, sent + u64::from(r.notification_sent))
        });
        Ok((total, sent))
    }
}

/// 内存通知历史存储
#[derive(Debug, Default, Clone)]
pub struct InMemoryNotificationHistoryStore {
    rows: Arc<Mutex<Vec<NotificationHistory>>>,
}

impl InMemoryNotificationHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全部记录（按写入顺序）
    pub fn entries(&self) -> Vec<NotificationHistory> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationHistoryStore for InMemoryNotificationHistoryStore {
    async fn append(&self, entry: NewNotificationHistory) -> Result<NotificationHistory, AppError> {
        let row = entry.into_history(Uuid::new_v4(), Utc::now());
        lock(&self.rows)?.push(row.clone());
        Ok(row)
    }

    async fn find_by_recipient(&self, recipient_id: Uuid) -> Result<Vec<NotificationHistory>, AppError> {
        let mut rows: Vec<NotificationHistory> = lock(&self.rows)?
            .iter()
            .filter(|r| r.recipient_id == recipient_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find_by_recipient_and_success(
        &self,
        recipient_id: Uuid,
        success: bool,
    ) -> Result<Vec<NotificationHistory>, AppError> {
        let rows = self.find_by_recipient(recipient_id).await?;
        Ok(rows.into_iter().filter(|r| r.success == success).collect())
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<(u64, u64), AppError> {
        let rows = lock(&self.rows)?;
        let (total, success) = rows
            .iter()
            .filter(|r| r.created_at >= since)
            .fold((0u64, 0u64), |(total, success), r| {
                (total + 1, success + u64::from(r.success))
            });
        Ok((total, success))
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let mut rows = lock(&self.rows)?;
        let before = rows.len();
        rows.retain(|r| r.created_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}
