//! Mock 对象

#![allow(dead_code)]

use async_trait::async_trait;
use carewatch::errors::{AppError, NotificationError};
use carewatch::models::{
    AlertHistory, AlertType, ConversationMessage, DailyCheckRecord, DeliveryReceipt, InsertOutcome,
    NewAlertHistory, NewNotificationHistory, NotificationChannelType, NotificationHistory,
    NotificationRequest, Subject,
};
use carewatch::repositories::{AlertHistoryStore, InMemoryAlertHistoryStore, NotificationHistoryStore};
use carewatch::services::{
    CheckInProvider, FailureRecovery, MessageProvider, NotificationService, PushChannel,
    SubjectDirectory,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 内存对象目录
#[derive(Default, Clone)]
pub struct InMemorySubjects {
    data: Arc<Mutex<HashMap<Uuid, Subject>>>,
}

impl InMemorySubjects {
    pub fn with(subjects: Vec<Subject>) -> Self {
        let store = Self::default();
        for subject in subjects {
            store.data.lock().unwrap().insert(subject.id, subject);
        }
        store
    }
}

#[async_trait]
impl SubjectDirectory for InMemorySubjects {
    async fn find_subject(&self, subject_id: Uuid) -> Result<Option<Subject>, AppError> {
        Ok(self.data.lock().unwrap().get(&subject_id).cloned())
    }
}

/// 固定消息来源
#[derive(Default, Clone)]
pub struct StaticMessages {
    data: Arc<Mutex<HashMap<Uuid, Vec<ConversationMessage>>>>,
}

impl StaticMessages {
    pub fn set(&self, subject_id: Uuid, messages: Vec<ConversationMessage>) {
        self.data.lock().unwrap().insert(subject_id, messages);
    }
}

#[async_trait]
impl MessageProvider for StaticMessages {
    async fn recent_messages(
        &self,
        subject_id: Uuid,
        _window_days: u32,
    ) -> Result<Vec<ConversationMessage>, AppError> {
        Ok(self.data.lock().unwrap().get(&subject_id).cloned().unwrap_or_default())
    }
}

/// 固定每日问候记录来源，按日期区间过滤
#[derive(Default, Clone)]
pub struct StaticCheckIns {
    data: Arc<Mutex<HashMap<Uuid, Vec<DailyCheckRecord>>>>,
}

impl StaticCheckIns {
    pub fn set(&self, subject_id: Uuid, records: Vec<DailyCheckRecord>) {
        self.data.lock().unwrap().insert(subject_id, records);
    }
}

#[async_trait]
impl CheckInProvider for StaticCheckIns {
    async fn recent_check_ins(
        &self,
        subject_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyCheckRecord>, AppError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .get(&subject_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.check_date >= from && r.check_date <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// 脚本化结果
#[derive(Debug, Clone)]
pub enum Outcome {
    Delivered,
    NotDelivered,
    Fail,
}

/// 按脚本依次返回结果的通知服务，脚本用完后重复最后一项
pub struct ScriptedService {
    channel: NotificationChannelType,
    available: bool,
    script: Mutex<VecDeque<Outcome>>,
    last: Mutex<Outcome>,
    pub calls: AtomicUsize,
}

impl ScriptedService {
    pub fn new(channel: NotificationChannelType, script: Vec<Outcome>) -> Arc<Self> {
        Self::build(channel, true, script)
    }

    pub fn always(channel: NotificationChannelType, outcome: Outcome) -> Arc<Self> {
        Self::build(channel, true, vec![outcome])
    }

    pub fn unavailable(channel: NotificationChannelType) -> Arc<Self> {
        Self::build(channel, false, vec![Outcome::Delivered])
    }

    fn build(channel: NotificationChannelType, available: bool, script: Vec<Outcome>) -> Arc<Self> {
        let last = script.last().cloned().unwrap_or(Outcome::Fail);
        Arc::new(Self {
            channel,
            available,
            script: Mutex::new(script.into()),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationService for ScriptedService {
    async fn send(&self, _request: &NotificationRequest) -> Result<DeliveryReceipt, NotificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = {
            let mut script = self.script.lock().unwrap();
            match script.pop_front() {
                Some(outcome) => {
                    *self.last.lock().unwrap() = outcome.clone();
                    outcome
                }
                None => self.last.lock().unwrap().clone(),
            }
        };

        match outcome {
            Outcome::Delivered => Ok(DeliveryReceipt::delivered(
                self.channel,
                Some(format!("msg-{}", self.call_count())),
            )),
            Outcome::NotDelivered => Ok(DeliveryReceipt::not_delivered(self.channel)),
            Outcome::Fail => Err(NotificationError::Transport {
                channel: self.channel,
                message: "connection reset".to_string(),
            }),
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn channel_type(&self) -> NotificationChannelType {
        self.channel
    }
}

/// 记录调用次数的推送渠道
pub struct CountingPushChannel {
    channel: NotificationChannelType,
    fail: AtomicBool,
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl CountingPushChannel {
    pub fn ok(channel: NotificationChannelType) -> Arc<Self> {
        Arc::new(Self {
            channel,
            fail: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(channel: NotificationChannelType) -> Arc<Self> {
        Arc::new(Self {
            channel,
            fail: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// 切换网关故障状态（模拟恢复）
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl PushChannel for CountingPushChannel {
    async fn send(&self, token: &str, title: &str, body: &str) -> Result<String, NotificationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::Transport {
                channel: self.channel,
                message: "push gateway unavailable".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((token.to_string(), title.to_string(), body.to_string()));
        Ok(format!("push-{}", sent.len()))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn channel_type(&self) -> NotificationChannelType {
        self.channel
    }
}

/// 统计收尾调用次数
#[derive(Default)]
pub struct CountingRecovery {
    pub calls: AtomicUsize,
}

impl CountingRecovery {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FailureRecovery for CountingRecovery {
    async fn recover(&self, _request: &NotificationRequest, _error: &NotificationError) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// 总是写入失败的通知历史存储
pub struct FailingHistoryStore;

#[async_trait]
impl NotificationHistoryStore for FailingHistoryStore {
    async fn append(&self, _entry: NewNotificationHistory) -> Result<NotificationHistory, AppError> {
        Err(AppError::InternalError("history table is read-only".to_string()))
    }

    async fn find_by_recipient(&self, _recipient_id: Uuid) -> Result<Vec<NotificationHistory>, AppError> {
        Ok(Vec::new())
    }

    async fn find_by_recipient_and_success(
        &self,
        _recipient_id: Uuid,
        _success: bool,
    ) -> Result<Vec<NotificationHistory>, AppError> {
        Ok(Vec::new())
    }

    async fn count_since(&self, _since: DateTime<Utc>) -> Result<(u64, u64), AppError> {
        Ok((0, 0))
    }

    async fn delete_before(&self, _cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        Ok(0)
    }
}

/// 指定预警类型写入失败，其余委托给内存存储
pub struct RejectingAlertHistoryStore {
    inner: InMemoryAlertHistoryStore,
    rejected: AlertType,
}

impl RejectingAlertHistoryStore {
    pub fn rejecting(rejected: AlertType) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryAlertHistoryStore::new(),
            rejected,
        })
    }
}

#[async_trait]
impl AlertHistoryStore for RejectingAlertHistoryStore {
    async fn insert_if_absent(&self, history: NewAlertHistory) -> Result<InsertOutcome, AppError> {
        if history.alert_type == self.rejected {
            return Err(AppError::InternalError(format!("cannot insert {} alert", history.alert_type)));
        }
        self.inner.insert_if_absent(history).await
    }

    async fn find_history(&self, history_id: Uuid) -> Result<Option<AlertHistory>, AppError> {
        self.inner.find_history(history_id).await
    }

    async fn find_recent(&self, subject_id: Uuid, since: DateTime<Utc>) -> Result<Vec<AlertHistory>, AppError> {
        self.inner.find_recent(subject_id, since).await
    }

    async fn update_notification_status(&self, history: &AlertHistory) -> Result<(), AppError> {
        self.inner.update_notification_status(history).await
    }

    async fn find_pending_notifications(&self) -> Result<Vec<AlertHistory>, AppError> {
        self.inner.find_pending_notifications().await
    }

    async fn count_notifications_since(&self, since: DateTime<Utc>) -> Result<(u64, u64), AppError> {
        self.inner.count_notifications_since(since).await
    }
}
